pub mod record;
pub mod types;

pub use record::AnalysisRecord;
pub use types::{Assessment, Priority, QualityBlock, RiskLevel};

use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),

    #[error("Failed to serialize analysis record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Output the assessment to the terminal (default) or to a file.
///
/// A `.json` path receives the [`AnalysisRecord`]; any other path receives
/// markdown.
#[instrument(skip(assessment), fields(repo = %assessment.repo_name))]
pub fn output(assessment: &Assessment, output_path: Option<&Path>) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing report to terminal");
            print_terminal_report(assessment);
            Ok(())
        }
        Some(path) if is_json(path) => {
            debug!(path = %path.display(), "writing analysis record");
            write_json_record(assessment, path)
        }
        Some(path) => {
            debug!(path = %path.display(), "writing markdown report");
            std::fs::write(path, render_markdown(assessment))?;
            Ok(())
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn write_json_record(assessment: &Assessment, path: &Path) -> Result<(), ReportError> {
    let record = AnalysisRecord::new(assessment);
    let json = serde_json::to_string_pretty(&record)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn print_terminal_report(assessment: &Assessment) {
    let readiness = &assessment.readiness;
    let analysis = &assessment.analysis;

    println!();
    println!("Repository: {}", assessment.repo_name.bold());
    if let Some(url) = &assessment.repo_url {
        println!("URL: {url}");
    }
    println!(
        "Files analyzed: {} | Functions: {} | Issues: {}",
        analysis.analyzed_files, analysis.total_functions, analysis.total_issues
    );
    println!();

    println!("═══ Readiness: {} ═══", colorize_score(readiness.readiness_score));
    println!("Model: {}", readiness.model);
    if let Some(error) = &readiness.error {
        println!("{} {}", "Degraded:".red().bold(), error);
    }
    println!("{}", readiness.summary);
    println!();
    print_block("Code Quality", &readiness.code_quality);
    print_block("Documentation", &readiness.documentation);
    print_block("Testing", &readiness.testing);
    println!("Security: {}", colorize_score(readiness.security.score));
    for concern in &readiness.security.concerns {
        println!("  - {concern}");
    }
    println!(
        "Technical debt: {} (effort: {})",
        readiness.technical_debt.level, readiness.technical_debt.estimated_effort
    );
    println!();

    println!("═══ Code Quality Score: {} ═══", colorize_score(analysis.overall_score));
    println!("Risk distribution:");
    for level in RiskLevel::ALL {
        println!(
            "  {:<10} {}",
            colorize_risk(level),
            analysis.risk_distribution.get(level)
        );
    }
    println!();

    if !analysis.top_issues.is_empty() {
        println!("═══ Top Issues ═══");
        for issue in &analysis.top_issues {
            println!(
                "  • [{}] {} ({})",
                colorize_risk(issue.severity),
                issue.message,
                issue.file_path
            );
            println!("    {}", issue.suggestion.dimmed());
        }
        println!();
    }

    if !analysis.worst_files.is_empty() {
        println!("═══ Worst Files ═══");
        for file in &analysis.worst_files {
            println!(
                "  {} {} ({} issues, {} functions)",
                colorize_score(file.score),
                file.path,
                file.issue_count,
                file.function_count
            );
        }
        println!();
    }

    if !analysis.recommendations.is_empty() {
        println!("═══ Recommendations ═══");
        for rec in &analysis.recommendations {
            println!("  • [{}] {}", colorize_priority(rec.priority), rec.message);
            println!("    {}", rec.suggestion.dimmed());
        }
        println!();
    }
}

fn print_block(title: &str, block: &QualityBlock) {
    println!("{}: {}", title, colorize_score(block.score));
    for strength in &block.strengths {
        println!("  + {strength}");
    }
    for issue in &block.issues {
        println!("  - {issue}");
    }
}

/// Render the assessment as a markdown document.
pub fn render_markdown(assessment: &Assessment) -> String {
    let readiness = &assessment.readiness;
    let analysis = &assessment.analysis;
    let mut md = String::new();

    md.push_str(&format!("# Readiness Report: {}\n\n", assessment.repo_name));
    if let Some(url) = &assessment.repo_url {
        md.push_str(&format!("**URL:** {url}\n\n"));
    }
    md.push_str(&format!(
        "**Files analyzed:** {} | **Functions:** {} | **Issues:** {}\n\n",
        analysis.analyzed_files, analysis.total_functions, analysis.total_issues
    ));

    md.push_str(&format!("## Readiness: {}/100\n\n", readiness.readiness_score));
    md.push_str(&format!("**Model:** {}\n\n", readiness.model));
    if let Some(error) = &readiness.error {
        md.push_str(&format!("> Degraded result: {error}\n\n"));
    }
    md.push_str(&format!("{}\n\n", readiness.summary));
    markdown_block(&mut md, "Code Quality", &readiness.code_quality);
    markdown_block(&mut md, "Documentation", &readiness.documentation);
    markdown_block(&mut md, "Testing", &readiness.testing);

    md.push_str(&format!("### Security ({}/100)\n\n", readiness.security.score));
    for concern in &readiness.security.concerns {
        md.push_str(&format!("- {concern}\n"));
    }
    for rec in &readiness.security.recommendations {
        md.push_str(&format!("- _Recommendation:_ {rec}\n"));
    }
    md.push('\n');

    let debt = &readiness.technical_debt;
    md.push_str(&format!(
        "### Technical Debt\n\n**Level:** {} | **Estimated effort:** {}\n\n",
        debt.level, debt.estimated_effort
    ));
    for item in &debt.items {
        md.push_str(&format!("- {item}\n"));
    }
    md.push('\n');

    md.push_str(&format!("## Code Quality Score: {}/100\n\n", analysis.overall_score));
    md.push_str("| Risk | Functions |\n|------|-----------|\n");
    for level in RiskLevel::ALL {
        md.push_str(&format!("| {} | {} |\n", level, analysis.risk_distribution.get(level)));
    }
    md.push('\n');

    if !analysis.top_issues.is_empty() {
        md.push_str("## Top Issues\n\n");
        for issue in &analysis.top_issues {
            md.push_str(&format!(
                "- **[{}]** {} (`{}`)\n  - {}\n",
                issue.severity, issue.message, issue.file_path, issue.suggestion
            ));
        }
        md.push('\n');
    }

    if !analysis.worst_files.is_empty() {
        md.push_str("## Worst Files\n\n");
        md.push_str("| File | Score | Issues | Functions |\n|------|-------|--------|-----------|\n");
        for file in &analysis.worst_files {
            md.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                file.path, file.score, file.issue_count, file.function_count
            ));
        }
        md.push('\n');
    }

    if !analysis.recommendations.is_empty() {
        md.push_str("## Recommendations\n\n");
        for rec in &analysis.recommendations {
            md.push_str(&format!(
                "- **[{}]** {}\n  - {}\n",
                rec.priority, rec.message, rec.suggestion
            ));
        }
        md.push('\n');
    }

    md.push_str("## Suggested README\n\n````markdown\n");
    md.push_str(readiness.suggested_readme.trim_end());
    md.push_str("\n````\n");
    md
}

fn markdown_block(md: &mut String, title: &str, block: &QualityBlock) {
    md.push_str(&format!("### {} ({}/100)\n\n", title, block.score));
    for strength in &block.strengths {
        md.push_str(&format!("- ✓ {strength}\n"));
    }
    for issue in &block.issues {
        md.push_str(&format!("- ✗ {issue}\n"));
    }
    md.push('\n');
}

fn colorize_risk(level: RiskLevel) -> colored::ColoredString {
    let label = level.to_string();
    match level {
        RiskLevel::Critical => label.red().bold(),
        RiskLevel::High => label.red(),
        RiskLevel::Medium => label.yellow().bold(),
        RiskLevel::Warning => label.yellow(),
        RiskLevel::Safe => label.green(),
    }
}

fn colorize_priority(priority: Priority) -> colored::ColoredString {
    let label = priority.to_string();
    match priority {
        Priority::Critical => label.red().bold(),
        Priority::High => label.red(),
        Priority::Medium => label.yellow(),
        Priority::Low => label.green(),
    }
}

fn colorize_score(score: u8) -> colored::ColoredString {
    let label = score.to_string();
    match score {
        80..=100 => label.green().bold(),
        50..=79 => label.yellow().bold(),
        _ => label.red().bold(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::report::types::{
        Issue, IssueKind, ReadinessReport, Recommendation, RepositoryAnalysis, RiskDistribution,
        SecuritySection, TechnicalDebt, WorstFile,
    };

    pub fn sample_assessment() -> Assessment {
        let mut distribution = RiskDistribution::default();
        distribution.record(RiskLevel::Critical);
        distribution.record(RiskLevel::Safe);

        Assessment {
            repo_name: "org/demo".to_string(),
            repo_url: Some("https://github.com/org/demo".to_string()),
            readiness: ReadinessReport {
                readiness_score: 72,
                model: "gpt-4o-mini".to_string(),
                summary: "Reasonably structured service.".to_string(),
                code_quality: QualityBlock {
                    score: 70,
                    strengths: vec!["Consistent layout".to_string()],
                    issues: vec!["One oversized handler".to_string()],
                },
                documentation: QualityBlock {
                    score: 60,
                    strengths: vec![],
                    issues: vec!["Sparse README".to_string()],
                },
                testing: QualityBlock::default(),
                security: SecuritySection {
                    score: 80,
                    concerns: vec!["Unpinned dependencies".to_string()],
                    recommendations: vec![],
                },
                technical_debt: TechnicalDebt {
                    level: "moderate".to_string(),
                    items: vec!["Split the request handler".to_string()],
                    estimated_effort: "2 days".to_string(),
                },
                suggested_readme: "# demo\n".to_string(),
                error: None,
            },
            analysis: RepositoryAnalysis {
                overall_score: 58,
                analyzed_files: 2,
                total_functions: 2,
                total_issues: 1,
                risk_distribution: distribution,
                top_issues: vec![Issue {
                    severity: RiskLevel::Critical,
                    kind: IssueKind::HighComplexity,
                    message: "Function handle has complexity 25".to_string(),
                    file_path: "src/server.rs".to_string(),
                    suggestion: "Split into smaller functions".to_string(),
                }],
                worst_files: vec![WorstFile {
                    path: "src/server.rs".to_string(),
                    score: 15,
                    issue_count: 1,
                    function_count: 1,
                }],
                recommendations: vec![Recommendation {
                    priority: Priority::Critical,
                    message: "Refactor critical functions".to_string(),
                    suggestion: "Start with src/server.rs".to_string(),
                }],
                files: vec![],
            },
        }
    }

    #[test]
    fn test_render_markdown() {
        let md = render_markdown(&sample_assessment());
        assert!(md.contains("# Readiness Report: org/demo"));
        assert!(md.contains("## Readiness: 72/100"));
        assert!(md.contains("**Model:** gpt-4o-mini"));
        assert!(md.contains("### Code Quality (70/100)"));
        assert!(md.contains("| CRITICAL | 1 |"));
        assert!(md.contains("| WARNING | 0 |"));
        assert!(md.contains("**[CRITICAL]** Function handle has complexity 25 (`src/server.rs`)"));
        assert!(md.contains("**[critical]** Refactor critical functions"));
        assert!(md.contains("## Suggested README"));
        assert!(!md.contains("Degraded result"));
    }

    #[test]
    fn test_render_markdown_marks_degraded_report() {
        let mut assessment = sample_assessment();
        assessment.readiness.error = Some("unparseable model response".to_string());
        let md = render_markdown(&assessment);
        assert!(md.contains("> Degraded result: unparseable model response"));
    }

    #[test]
    fn test_output_markdown_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        output(&sample_assessment(), Some(&path)).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Readiness Report"));
    }

    #[test]
    fn test_output_json_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.JSON");
        output(&sample_assessment(), Some(&path)).unwrap();

        let record: AnalysisRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(record.repo_name, "org/demo");
        assert_eq!(record.readiness_score, 72);
        assert_eq!(record.overall_score, 58);
    }

    #[test]
    fn test_output_to_terminal() {
        // Should not panic
        output(&sample_assessment(), None).unwrap();
    }
}
