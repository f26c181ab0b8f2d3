use crate::config::LimitsConfig;
use crate::report::types::{Function, Issue, IssueKind, RiskLevel};

use super::metrics::{Family, FileMeasurements};
use super::risk::RiskTable;

/// Remediation hint for each issue kind.
pub fn suggestion(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::HighComplexity => {
            "Split the function into smaller helpers and replace nested conditionals with early returns"
        }
        IssueKind::LongFunction => {
            "Extract cohesive blocks into well-named functions so each does one thing"
        }
        IssueKind::LowCommentRatio => {
            "Document public items and explain non-obvious logic with comments"
        }
        IssueKind::LargeFile => {
            "Break the file into focused modules grouped by responsibility"
        }
    }
}

/// Turns measurements into issues.
///
/// Detection only looks at its inputs, so the same file always yields the
/// same issues in the same order.
pub struct IssueDetector<'a> {
    table: &'a RiskTable,
    limits: &'a LimitsConfig,
}

impl<'a> IssueDetector<'a> {
    pub fn new(table: &'a RiskTable, limits: &'a LimitsConfig) -> Self {
        Self { table, limits }
    }

    /// Complexity and length are judged separately so a function can carry
    /// one issue for each.
    pub fn function_issues(&self, path: &str, function: &Function) -> Vec<Issue> {
        let mut issues = Vec::new();

        let by_complexity = self.table.classify_complexity(function.complexity);
        if by_complexity >= RiskLevel::Warning {
            issues.push(issue(
                by_complexity,
                IssueKind::HighComplexity,
                path,
                format!(
                    "Function `{}` in {} has cyclomatic complexity {} ({})",
                    function.name, path, function.complexity, by_complexity
                ),
            ));
        }

        let by_length = self.table.classify_length(function.length);
        if by_length >= RiskLevel::Warning {
            issues.push(issue(
                by_length,
                IssueKind::LongFunction,
                path,
                format!(
                    "Function `{}` in {} spans {} lines ({})",
                    function.name, path, function.length, by_length
                ),
            ));
        }

        issues
    }

    pub fn file_issues(&self, path: &str, language: &str, m: &FileMeasurements) -> Vec<Issue> {
        let mut issues = Vec::new();

        let documentable = m.code_lines > 0 && Family::from_tag(language).has_comments();
        if documentable && m.comment_ratio < self.limits.min_comment_ratio {
            issues.push(issue(
                RiskLevel::Warning,
                IssueKind::LowCommentRatio,
                path,
                format!(
                    "{} has a comment ratio of {:.0}% (minimum {:.0}%)",
                    path,
                    m.comment_ratio * 100.0,
                    self.limits.min_comment_ratio * 100.0
                ),
            ));
        }

        if m.line_count > self.limits.max_file_lines {
            let severity = if m.line_count > self.limits.max_file_lines * 2 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };
            issues.push(issue(
                severity,
                IssueKind::LargeFile,
                path,
                format!(
                    "{} has {} lines (maximum {})",
                    path, m.line_count, self.limits.max_file_lines
                ),
            ));
        }

        issues
    }
}

fn issue(severity: RiskLevel, kind: IssueKind, path: &str, message: String) -> Issue {
    Issue {
        severity,
        kind,
        message,
        file_path: path.to_string(),
        suggestion: suggestion(kind).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(complexity: u32, length: usize) -> Function {
        Function {
            name: "process".to_string(),
            start_line: 1,
            length,
            complexity,
            risk_level: RiskTable::default().classify(complexity, length),
        }
    }

    fn measurements(
        line_count: usize,
        code_lines: usize,
        comment_lines: usize,
    ) -> FileMeasurements {
        FileMeasurements {
            line_count,
            code_lines,
            comment_lines,
            comment_ratio: comment_lines as f64 / line_count.max(1) as f64,
            functions: vec![],
            parsed: true,
        }
    }

    #[test]
    fn test_simple_function_has_no_issues() {
        let table = RiskTable::default();
        let limits = LimitsConfig::default();
        let detector = IssueDetector::new(&table, &limits);
        assert!(detector.function_issues("src/a.rs", &function(2, 10)).is_empty());
    }

    #[test]
    fn test_critical_function_emits_both_issues() {
        let table = RiskTable::default();
        let limits = LimitsConfig::default();
        let detector = IssueDetector::new(&table, &limits);
        let issues = detector.function_issues("src/a.rs", &function(25, 200));
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == RiskLevel::Critical));
        assert_eq!(issues[0].kind, IssueKind::HighComplexity);
        assert!(issues[0].message.contains("`process`"));
        assert!(issues[0].message.contains("src/a.rs"));
        assert_eq!(issues[1].kind, IssueKind::LongFunction);
        assert_eq!(issues[1].suggestion, suggestion(IssueKind::LongFunction));
    }

    #[test]
    fn test_warning_complexity_only() {
        let table = RiskTable::default();
        let limits = LimitsConfig::default();
        let detector = IssueDetector::new(&table, &limits);
        let issues = detector.function_issues("a.py", &function(5, 20));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, RiskLevel::Warning);
    }

    #[test]
    fn test_low_comment_ratio() {
        let table = RiskTable::default();
        let limits = LimitsConfig::default();
        let detector = IssueDetector::new(&table, &limits);
        let issues = detector.file_issues("src/a.rs", "rust", &measurements(100, 95, 5));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::LowCommentRatio);
        assert!(issues[0].message.contains("5%"));
    }

    #[test]
    fn test_no_comment_issue_for_unknown_language_or_empty_file() {
        let table = RiskTable::default();
        let limits = LimitsConfig::default();
        let detector = IssueDetector::new(&table, &limits);
        assert!(detector.file_issues("data.txt", "text", &measurements(10, 10, 0)).is_empty());
        assert!(detector.file_issues("src/a.rs", "rust", &measurements(0, 0, 0)).is_empty());
    }

    #[test]
    fn test_large_file_severity_scales() {
        let table = RiskTable::default();
        let limits = LimitsConfig::default();
        let detector = IssueDetector::new(&table, &limits);

        let medium = detector.file_issues("a.rs", "rust", &measurements(600, 400, 200));
        assert_eq!(medium.len(), 1);
        assert_eq!(medium[0].kind, IssueKind::LargeFile);
        assert_eq!(medium[0].severity, RiskLevel::Medium);

        let high = detector.file_issues("a.rs", "rust", &measurements(1200, 800, 400));
        assert_eq!(high[0].severity, RiskLevel::High);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let table = RiskTable::default();
        let limits = LimitsConfig::default();
        let detector = IssueDetector::new(&table, &limits);
        let f = function(14, 90);
        assert_eq!(
            detector.function_issues("x.go", &f),
            detector.function_issues("x.go", &f)
        );
    }
}
