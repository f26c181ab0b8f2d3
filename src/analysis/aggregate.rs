use std::cmp::Reverse;

use crate::config::{LimitsConfig, ScoringConfig};
use crate::report::types::{Issue, RiskDistribution, RiskLevel, SourceFile, WorstFile};

/// Score given to a file that could not be parsed.
pub const NEUTRAL_SCORE: u8 = 100;

/// Repository-level figures derived from scored files.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub overall_score: u8,
    pub total_functions: usize,
    pub total_issues: usize,
    pub risk_distribution: RiskDistribution,
    pub top_issues: Vec<Issue>,
    pub worst_files: Vec<WorstFile>,
}

/// 100 minus the weighted penalty of every issue, floored at 0.
pub fn score_file(issues: &[Issue], weights: &ScoringConfig) -> u8 {
    let penalty = issues
        .iter()
        .map(|i| weights.weight(i.severity))
        .fold(0u32, u32::saturating_add);
    100u32.saturating_sub(penalty) as u8
}

/// Mean of the file scores rounded to the nearest integer; 0 without files.
pub fn overall_score(files: &[SourceFile]) -> u8 {
    if files.is_empty() {
        return 0;
    }
    let sum: u64 = files.iter().map(|f| u64::from(f.score)).sum();
    let mean = sum as f64 / files.len() as f64;
    mean.round().clamp(0.0, 100.0) as u8
}

pub fn risk_distribution(files: &[SourceFile]) -> RiskDistribution {
    let mut distribution = RiskDistribution::default();
    for function in files.iter().flat_map(|f| &f.functions) {
        distribution.record(function.risk_level);
    }
    distribution
}

/// CRITICAL and HIGH issues, most severe first, then by path.
pub fn top_issues(files: &[SourceFile], max: usize) -> Vec<Issue> {
    let mut issues: Vec<Issue> = files
        .iter()
        .flat_map(|f| &f.issues)
        .filter(|i| i.severity >= RiskLevel::High)
        .cloned()
        .collect();
    // stable sort keeps detection order for equal keys
    issues.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.file_path.cmp(&b.file_path))
    });
    issues.truncate(max);
    issues
}

/// Lowest scores first; ties go to the file with more issues, then by path.
pub fn worst_files(files: &[SourceFile], max: usize) -> Vec<WorstFile> {
    let mut ranked: Vec<WorstFile> = files
        .iter()
        .map(|f| WorstFile {
            path: f.file_path.clone(),
            score: f.score,
            issue_count: f.issues.len(),
            function_count: f.functions.len(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        (a.score, Reverse(a.issue_count), &a.path).cmp(&(b.score, Reverse(b.issue_count), &b.path))
    });
    ranked.truncate(max);
    ranked
}

pub fn aggregate(files: &[SourceFile], limits: &LimitsConfig) -> Aggregate {
    let risk_distribution = risk_distribution(files);
    Aggregate {
        overall_score: overall_score(files),
        total_functions: risk_distribution.total(),
        total_issues: files.iter().map(|f| f.issues.len()).sum(),
        risk_distribution,
        top_issues: top_issues(files, limits.max_top_issues),
        worst_files: worst_files(files, limits.max_worst_files),
    }
}
