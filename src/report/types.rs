use serde::{Deserialize, Serialize};

/// Risk level for a function, an issue, or a file.
///
/// Variants are declared least severe first so the derived `Ord` can be used
/// for sorting and thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Safe,
    Warning,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// All levels, most severe first.
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Critical,
        RiskLevel::High,
        RiskLevel::Medium,
        RiskLevel::Warning,
        RiskLevel::Safe,
    ];
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "SAFE"),
            RiskLevel::Warning => write!(f, "WARNING"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// What triggered an issue. Keys the suggestion catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    HighComplexity,
    LongFunction,
    LowCommentRatio,
    LargeFile,
}

/// A single issue detected in a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: RiskLevel,
    pub kind: IssueKind,
    /// Human-readable description naming the construct and file
    pub message: String,
    /// Path of the file that produced this issue
    pub file_path: String,
    /// Remediation hint from the catalog
    pub suggestion: String,
}

/// A function detected by the metric extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub name: String,
    /// 1-based line where the definition starts
    pub start_line: usize,
    /// Number of lines from signature to end of body
    pub length: usize,
    /// McCabe-style complexity, 1 for straight-line code
    pub complexity: u32,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetrics {
    pub code_lines: usize,
    pub comment_lines: usize,
    pub comment_ratio: f64,
}

/// A scored source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub file_path: String,
    pub language: String,
    pub line_count: usize,
    pub metrics: FileMetrics,
    pub functions: Vec<Function>,
    pub issues: Vec<Issue>,
    pub score: u8,
}

/// Function counts per risk level. Every level is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskDistribution {
    #[serde(rename = "CRITICAL")]
    pub critical: usize,
    #[serde(rename = "HIGH")]
    pub high: usize,
    #[serde(rename = "MEDIUM")]
    pub medium: usize,
    #[serde(rename = "WARNING")]
    pub warning: usize,
    #[serde(rename = "SAFE")]
    pub safe: usize,
}

impl RiskDistribution {
    pub fn get(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Critical => self.critical,
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Warning => self.warning,
            RiskLevel::Safe => self.safe,
        }
    }

    pub fn record(&mut self, level: RiskLevel) {
        let slot = match level {
            RiskLevel::Critical => &mut self.critical,
            RiskLevel::High => &mut self.high,
            RiskLevel::Medium => &mut self.medium,
            RiskLevel::Warning => &mut self.warning,
            RiskLevel::Safe => &mut self.safe,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        RiskLevel::ALL.iter().map(|level| self.get(*level)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorstFile {
    pub path: String,
    pub score: u8,
    pub issue_count: usize,
    pub function_count: usize,
}

/// Recommendation priority. Declared lowest first for `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: Priority,
    pub message: String,
    pub suggestion: String,
}

/// Metrics-based analysis of a whole repository.
///
/// Built once per run by the aggregator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryAnalysis {
    pub overall_score: u8,
    pub analyzed_files: usize,
    pub total_functions: usize,
    pub total_issues: usize,
    pub risk_distribution: RiskDistribution,
    pub top_issues: Vec<Issue>,
    pub worst_files: Vec<WorstFile>,
    pub recommendations: Vec<Recommendation>,
    pub files: Vec<SourceFile>,
}

/// Score plus qualitative notes for one quality dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityBlock {
    pub score: u8,
    pub strengths: Vec<String>,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecuritySection {
    pub score: u8,
    pub concerns: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TechnicalDebt {
    /// Coarse label such as "low", "moderate", "high" or "unknown"
    pub level: String,
    pub items: Vec<String>,
    pub estimated_effort: String,
}

/// Readiness assessment produced by either the model-backed analyzer or the
/// heuristic fallback. Both paths fill every field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub readiness_score: u8,
    /// Which analyzer produced this report (model name or fallback tag)
    pub model: String,
    pub summary: String,
    pub code_quality: QualityBlock,
    pub documentation: QualityBlock,
    pub testing: QualityBlock,
    pub security: SecuritySection,
    pub technical_debt: TechnicalDebt,
    pub suggested_readme: String,
    /// Set when the report is a degraded substitute
    pub error: Option<String>,
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub repo_name: String,
    pub repo_url: Option<String>,
    pub readiness: ReadinessReport,
    pub analysis: RepositoryAnalysis,
}
