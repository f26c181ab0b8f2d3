pub mod aggregate;
pub mod fallback;
pub mod issues;
pub mod llm;
pub mod metrics;
pub mod recommend;
pub mod risk;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::report::types::{
    Assessment, FileMetrics, Function, ReadinessReport, RepositoryAnalysis, SourceFile,
};
use crate::source::{RepositorySnapshot, SourceInput};

use aggregate::NEUTRAL_SCORE;
use fallback::FallbackAnalyzer;
use issues::IssueDetector;
use llm::LlmError;
use recommend::RepositoryState;
use risk::RiskTable;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Model-backed analysis failed: {0}")]
    Model(#[from] LlmError),
}

/// Text handed to readiness analyzers.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRequest {
    pub repo_name: String,
    pub repo_url: Option<String>,
    /// README followed by every source file, cut to the character budget
    pub merged_text: String,
}

impl AssessmentRequest {
    pub fn from_snapshot(snapshot: &RepositorySnapshot, max_chars: usize) -> Self {
        Self {
            repo_name: snapshot.name.clone(),
            repo_url: snapshot.url.clone(),
            merged_text: merge_text(snapshot.readme.as_deref(), &snapshot.files, max_chars),
        }
    }
}

/// Core trait for readiness analyzers.
/// Both implementations must fill every field of ReadinessReport so callers
/// never need to know which one ran.
#[async_trait]
pub trait ReadinessAnalyzer: Send + Sync {
    /// Name reported in logs (model identifier or fallback tag)
    fn name(&self) -> &str;

    async fn assess(&self, request: &AssessmentRequest) -> Result<ReadinessReport, AnalysisError>;
}

/// Concatenate README and file contents, truncated to `max_chars` characters.
pub fn merge_text(readme: Option<&str>, files: &[SourceInput], max_chars: usize) -> String {
    let mut merged = String::new();
    if let Some(readme) = readme.filter(|r| !r.trim().is_empty()) {
        merged.push_str("=== README ===\n");
        merged.push_str(readme);
        merged.push_str("\n\n");
    }
    for file in files {
        if merged.len() >= max_chars.saturating_mul(4) {
            break;
        }
        merged.push_str(&format!("=== {} ({}) ===\n", file.path, file.language));
        merged.push_str(&file.text);
        merged.push_str("\n\n");
    }
    if let Some((cut, _)) = merged.char_indices().nth(max_chars) {
        merged.truncate(cut);
    }
    merged
}

/// Measure, classify and score one file.
pub fn analyze_file(input: &SourceInput, table: &RiskTable, config: &Config) -> SourceFile {
    let measured = metrics::measure(&input.language, &input.text);

    if !measured.parsed {
        warn!(path = %input.path, "file could not be parsed, scoring as neutral");
        return SourceFile {
            file_path: input.path.clone(),
            language: input.language.clone(),
            line_count: 0,
            metrics: Default::default(),
            functions: Vec::new(),
            issues: Vec::new(),
            score: NEUTRAL_SCORE,
        };
    }

    let functions: Vec<Function> = measured
        .functions
        .iter()
        .map(|raw| Function {
            name: raw.name.clone(),
            start_line: raw.start_line,
            length: raw.length,
            complexity: raw.complexity,
            risk_level: table.classify(raw.complexity, raw.length),
        })
        .collect();

    let detector = IssueDetector::new(table, &config.limits);
    let mut issues: Vec<_> = functions
        .iter()
        .flat_map(|f| detector.function_issues(&input.path, f))
        .collect();
    issues.extend(detector.file_issues(&input.path, &input.language, &measured));

    let score = aggregate::score_file(&issues, &config.scoring);
    debug!(
        path = %input.path,
        functions = functions.len(),
        issues = issues.len(),
        score,
        "scored file"
    );

    SourceFile {
        file_path: input.path.clone(),
        language: input.language.clone(),
        line_count: measured.line_count,
        metrics: FileMetrics {
            code_lines: measured.code_lines,
            comment_lines: measured.comment_lines,
            comment_ratio: measured.comment_ratio,
        },
        functions,
        issues,
        score,
    }
}

/// Metrics path: files in, RepositoryAnalysis out. Pure and synchronous.
pub fn analyze_repository(
    files: &[SourceInput],
    readme: Option<&str>,
    config: &Config,
) -> RepositoryAnalysis {
    let limit = config.limits.max_files;
    if files.len() > limit {
        warn!(files = files.len(), limit, "too many files, analyzing the first {limit}");
    }
    let table = config.risk_table();
    let scored: Vec<SourceFile> = files
        .iter()
        .take(limit)
        .map(|f| analyze_file(f, &table, config))
        .collect();

    let summary = aggregate::aggregate(&scored, &config.limits);
    let recommendations = recommend::generate(&RepositoryState {
        overall_score: summary.overall_score,
        risk_distribution: summary.risk_distribution,
        files: &scored,
        has_readme: readme.is_some_and(|r| !r.trim().is_empty()),
        min_comment_ratio: config.limits.min_comment_ratio,
        max_file_lines: config.limits.max_file_lines,
    });

    RepositoryAnalysis {
        overall_score: summary.overall_score,
        analyzed_files: scored.len(),
        total_functions: summary.total_functions,
        total_issues: summary.total_issues,
        risk_distribution: summary.risk_distribution,
        top_issues: summary.top_issues,
        worst_files: summary.worst_files,
        recommendations,
        files: scored,
    }
}

/// Ask the primary analyzer, falling back to heuristics when it is absent,
/// fails, or exceeds `timeout`.
pub async fn assess_readiness(
    request: &AssessmentRequest,
    primary: Option<&dyn ReadinessAnalyzer>,
    timeout: Duration,
) -> ReadinessReport {
    let fallback = FallbackAnalyzer::new();
    let Some(primary) = primary else {
        info!("no model-backed analyzer configured, using heuristic fallback");
        return fallback.report(request);
    };

    let attempt = primary
        .assess(request)
        .instrument(info_span!("assess", analyzer = %primary.name()));
    match tokio::time::timeout(timeout, attempt).await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            warn!(error = %e, "model-backed analysis failed, using heuristic fallback");
            fallback.report(request)
        }
        Err(_) => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "model-backed analysis timed out, using heuristic fallback"
            );
            fallback.report(request)
        }
    }
}

/// Run a full assessment over one snapshot. Never fails: every error path
/// ends in a structurally complete result.
pub async fn run(
    snapshot: &RepositorySnapshot,
    config: &Config,
    primary: Option<&dyn ReadinessAnalyzer>,
) -> Assessment {
    let analysis = analyze_repository(&snapshot.files, snapshot.readme.as_deref(), config);
    info!(
        files = analysis.analyzed_files,
        functions = analysis.total_functions,
        issues = analysis.total_issues,
        score = analysis.overall_score,
        "metrics analysis complete"
    );

    let request = AssessmentRequest::from_snapshot(snapshot, config.limits.max_merged_chars);
    let timeout = Duration::from_secs(config.llm.timeout_secs);
    let readiness = assess_readiness(&request, primary, timeout).await;
    info!(
        model = %readiness.model,
        readiness = readiness.readiness_score,
        "readiness assessment complete"
    );

    Assessment {
        repo_name: snapshot.name.clone(),
        repo_url: snapshot.url.clone(),
        readiness,
        analysis,
    }
}
