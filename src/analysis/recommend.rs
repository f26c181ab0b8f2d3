use crate::report::types::{Priority, Recommendation, RiskDistribution, SourceFile};

/// Aggregate state the recommendation rules look at.
#[derive(Debug, Clone)]
pub struct RepositoryState<'a> {
    pub overall_score: u8,
    pub risk_distribution: RiskDistribution,
    pub files: &'a [SourceFile],
    pub has_readme: bool,
    pub min_comment_ratio: f64,
    pub max_file_lines: usize,
}

impl RepositoryState<'_> {
    /// Comment lines over total lines across every file.
    pub fn comment_ratio(&self) -> f64 {
        let lines: usize = self.files.iter().map(|f| f.line_count).sum();
        let comments: usize = self.files.iter().map(|f| f.metrics.comment_lines).sum();
        comments as f64 / lines.max(1) as f64
    }

    fn has_tests(&self) -> bool {
        self.files.iter().any(|f| is_test_path(&f.file_path))
    }
}

fn is_test_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.starts_with("test")
        || lower.contains("/test")
        || lower.contains("_test.")
        || lower.contains(".test.")
        || lower.contains(".spec.")
        || lower.contains("/spec/")
}

type Rule = fn(&RepositoryState<'_>) -> Option<Recommendation>;

/// Evaluated in this order; the order breaks ties between equal priorities.
const RULES: &[Rule] = &[
    low_overall_score,
    missing_readme,
    critical_functions,
    high_risk_functions,
    sparse_comments,
    oversized_files,
    missing_tests,
    healthy_codebase,
];

/// Run every rule and order the results by priority, most urgent first.
pub fn generate(state: &RepositoryState<'_>) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> =
        RULES.iter().filter_map(|rule| rule(state)).collect();
    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
    recommendations
}

fn recommendation(priority: Priority, message: String, suggestion: &str) -> Recommendation {
    Recommendation {
        priority,
        message,
        suggestion: suggestion.to_string(),
    }
}

fn low_overall_score(state: &RepositoryState<'_>) -> Option<Recommendation> {
    (!state.files.is_empty() && state.overall_score < 50).then(|| {
        recommendation(
            Priority::Critical,
            format!("Overall quality score is {} out of 100", state.overall_score),
            "Make refactoring the worst files a priority before adding new features",
        )
    })
}

fn missing_readme(state: &RepositoryState<'_>) -> Option<Recommendation> {
    (!state.has_readme).then(|| {
        recommendation(
            Priority::High,
            "Repository has no README".to_string(),
            "Add a README describing purpose, installation, usage and how to contribute",
        )
    })
}

fn critical_functions(state: &RepositoryState<'_>) -> Option<Recommendation> {
    let count = state.risk_distribution.critical;
    (count > 0).then(|| {
        recommendation(
            Priority::High,
            format!("{count} function(s) are at CRITICAL risk"),
            "Break up the most complex functions first; they are the likeliest source of defects",
        )
    })
}

fn high_risk_functions(state: &RepositoryState<'_>) -> Option<Recommendation> {
    let count = state.risk_distribution.high;
    (count > 0).then(|| {
        recommendation(
            Priority::Medium,
            format!("{count} function(s) are at HIGH risk"),
            "Schedule refactoring for high-risk functions and cover them with tests first",
        )
    })
}

fn sparse_comments(state: &RepositoryState<'_>) -> Option<Recommendation> {
    let ratio = state.comment_ratio();
    (!state.files.is_empty() && ratio < state.min_comment_ratio).then(|| {
        recommendation(
            Priority::Medium,
            format!(
                "Comment ratio across the repository is {:.0}% (target {:.0}%)",
                ratio * 100.0,
                state.min_comment_ratio * 100.0
            ),
            "Document public interfaces and the reasoning behind non-obvious code",
        )
    })
}

fn oversized_files(state: &RepositoryState<'_>) -> Option<Recommendation> {
    let count = state
        .files
        .iter()
        .filter(|f| f.line_count > state.max_file_lines)
        .count();
    (count > 0).then(|| {
        recommendation(
            Priority::Medium,
            format!("{count} file(s) exceed {} lines", state.max_file_lines),
            "Split large files into smaller modules with a single responsibility",
        )
    })
}

fn missing_tests(state: &RepositoryState<'_>) -> Option<Recommendation> {
    (!state.files.is_empty() && !state.has_tests()).then(|| {
        recommendation(
            Priority::Medium,
            "No test files were found".to_string(),
            "Add automated tests for core behaviour and run them in CI",
        )
    })
}

fn healthy_codebase(state: &RepositoryState<'_>) -> Option<Recommendation> {
    let risky = state.risk_distribution.critical + state.risk_distribution.high;
    (!state.files.is_empty() && state.overall_score >= 80 && risky == 0).then(|| {
        recommendation(
            Priority::Low,
            format!("Codebase is in good shape with a score of {}", state.overall_score),
            "Keep complexity in check with code review and track the score over time",
        )
    })
}
