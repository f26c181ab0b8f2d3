use async_trait::async_trait;

use super::{AnalysisError, AssessmentRequest, ReadinessAnalyzer};
use crate::report::types::{QualityBlock, ReadinessReport, SecuritySection, TechnicalDebt};

/// Model tag reported by heuristic results.
pub const FALLBACK_MODEL: &str = "heuristic-fallback";

const BASE_SCORE: u32 = 50;

/// Keywords that define code in at least one supported language.
const CODE_KEYWORDS: &[&str] = &[
    "fn ", "def ", "function ", "class ", "func ", "public ", "import ", "const ",
];

/// Merged text longer than this counts as a substantial codebase.
const SUBSTANTIAL_LENGTH: usize = 5000;

struct HeuristicRule {
    delta: u32,
    applies: fn(&str) -> bool,
}

fn mentions_readme(text: &str) -> bool {
    text.to_lowercase().contains("readme")
}

fn defines_code(text: &str) -> bool {
    CODE_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

fn is_substantial(text: &str) -> bool {
    text.chars().count() > SUBSTANTIAL_LENGTH
}

fn mentions_tests(text: &str) -> bool {
    text.to_lowercase().contains("test")
}

const SCORE_RULES: &[HeuristicRule] = &[
    HeuristicRule { delta: 20, applies: mentions_readme },
    HeuristicRule { delta: 15, applies: defines_code },
    HeuristicRule { delta: 10, applies: is_substantial },
];

/// Deterministic readiness analysis from textual heuristics.
///
/// Used whenever the model-backed analyzer is missing, failing or too slow.
/// The report has the same shape as a model-backed one; the security and
/// technical-debt sections are placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackAnalyzer;

impl FallbackAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Base 50 plus the delta of every matching rule, capped at 100.
    pub fn score(text: &str) -> u8 {
        let total: u32 = SCORE_RULES
            .iter()
            .filter(|rule| (rule.applies)(text))
            .map(|rule| rule.delta)
            .sum::<u32>()
            + BASE_SCORE;
        total.min(100) as u8
    }

    pub fn report(&self, request: &AssessmentRequest) -> ReadinessReport {
        let text = request.merged_text.as_str();
        let has_readme = mentions_readme(text);
        let has_code = defines_code(text);
        let has_tests = mentions_tests(text);

        let code_quality = if has_code {
            block(70, "Source code with recognizable definitions is present", None)
        } else {
            block(40, "", Some("No recognizable source definitions were found"))
        };
        let documentation = if has_readme {
            block(75, "A README is present", None)
        } else {
            block(30, "", Some("No README was found"))
        };
        let testing = if has_tests {
            block(60, "Test-related code or documentation is present", None)
        } else {
            block(30, "", Some("No sign of automated tests"))
        };

        ReadinessReport {
            readiness_score: Self::score(text),
            model: FALLBACK_MODEL.to_string(),
            summary: format!(
                "Heuristic assessment of {}: README {}, source code {}, tests {}.",
                request.repo_name,
                found(has_readme),
                found(has_code),
                found(has_tests)
            ),
            code_quality,
            documentation,
            testing,
            security: SecuritySection {
                score: 50,
                concerns: vec![
                    "Security review is not available in heuristic mode".to_string(),
                ],
                recommendations: vec![
                    "Audit dependencies and scan the repository for committed secrets".to_string(),
                ],
            },
            technical_debt: TechnicalDebt {
                level: "unknown".to_string(),
                items: vec![
                    "Technical debt estimation is not available in heuristic mode".to_string(),
                ],
                estimated_effort: "unknown".to_string(),
            },
            suggested_readme: readme_template(&request.repo_name),
            error: None,
        }
    }
}

#[async_trait]
impl ReadinessAnalyzer for FallbackAnalyzer {
    fn name(&self) -> &str {
        FALLBACK_MODEL
    }

    async fn assess(&self, request: &AssessmentRequest) -> Result<ReadinessReport, AnalysisError> {
        Ok(self.report(request))
    }
}

fn found(present: bool) -> &'static str {
    if present {
        "found"
    } else {
        "missing"
    }
}

fn block(score: u8, strength: &str, issue: Option<&str>) -> QualityBlock {
    QualityBlock {
        score,
        strengths: (!strength.is_empty())
            .then(|| vec![strength.to_string()])
            .unwrap_or_default(),
        issues: issue.map(|i| vec![i.to_string()]).unwrap_or_default(),
    }
}

/// Skeleton README offered when the analyzer cannot write a tailored one.
pub fn readme_template(repo_name: &str) -> String {
    format!(
        "# {repo_name}\n\n\
         A short description of what {repo_name} does and who it is for.\n\n\
         ## Installation\n\n\
         Describe how to install or build the project.\n\n\
         ## Usage\n\n\
         Show the most common way to use it.\n\n\
         ## Testing\n\n\
         Explain how to run the test suite.\n\n\
         ## Contributing\n\n\
         Describe how to report issues and submit changes.\n\n\
         ## License\n\n\
         State the license.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> AssessmentRequest {
        AssessmentRequest {
            repo_name: "demo".to_string(),
            repo_url: None,
            merged_text: text.to_string(),
        }
    }

    #[test]
    fn test_base_score_for_plain_text() {
        assert_eq!(FallbackAnalyzer::score("nothing to see"), 50);
        assert_eq!(FallbackAnalyzer::score(""), 50);
    }

    #[test]
    fn test_each_rule_delta() {
        assert_eq!(FallbackAnalyzer::score("see the README"), 70);
        assert_eq!(FallbackAnalyzer::score("def main(): pass"), 65);
        assert_eq!(FallbackAnalyzer::score(&"x".repeat(5001)), 60);
        assert_eq!(FallbackAnalyzer::score(&"x".repeat(5000)), 50);
    }

    #[test]
    fn test_all_rules_combined() {
        let mut text = String::from("# readme\nfn main() {}\n");
        text.push_str(&"a".repeat(6000));
        let score = FallbackAnalyzer::score(&text);
        assert_eq!(score, 95);
        assert!(score >= 85);
    }

    #[test]
    fn test_score_is_deterministic() {
        let text = "README\nfunction go() {}";
        assert_eq!(FallbackAnalyzer::score(text), FallbackAnalyzer::score(text));
    }

    #[test]
    fn test_report_is_complete() {
        let report = FallbackAnalyzer::new().report(&request("README\nfn main() {}\n#[test]"));
        assert_eq!(report.model, FALLBACK_MODEL);
        assert_eq!(report.readiness_score, 85);
        assert!(report.error.is_none());
        assert_eq!(report.documentation.score, 75);
        assert_eq!(report.testing.score, 60);
        assert!(!report.security.concerns.is_empty());
        assert_eq!(report.technical_debt.level, "unknown");
        assert!(report.suggested_readme.starts_with("# demo"));
    }

    #[test]
    fn test_report_for_empty_text() {
        let report = FallbackAnalyzer::new().report(&request(""));
        assert_eq!(report.readiness_score, 50);
        assert_eq!(report.code_quality.score, 40);
        assert_eq!(report.code_quality.issues.len(), 1);
        assert!(report.code_quality.strengths.is_empty());
    }

    #[tokio::test]
    async fn test_trait_entry_point_matches_direct_report() {
        let analyzer = FallbackAnalyzer::new();
        let req = request("readme");
        let via_trait = analyzer.assess(&req).await.unwrap();
        assert_eq!(via_trait, analyzer.report(&req));
    }
}
