use serde::{Deserialize, Serialize};

use crate::report::types::RiskLevel;

/// One row of the classification table. A row matches when either of its
/// thresholds is reached; a missing threshold never matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskThreshold {
    pub level: RiskLevel,
    #[serde(default)]
    pub complexity: Option<u32>,
    #[serde(default)]
    pub length: Option<usize>,
}

impl RiskThreshold {
    const fn new(level: RiskLevel, complexity: Option<u32>, length: Option<usize>) -> Self {
        Self { level, complexity, length }
    }

    fn matches(&self, complexity: Option<u32>, length: Option<usize>) -> bool {
        let by_complexity =
            matches!((self.complexity, complexity), (Some(min), Some(c)) if c >= min);
        let by_length = matches!((self.length, length), (Some(min), Some(l)) if l >= min);
        by_complexity || by_length
    }
}

const DEFAULT_THRESHOLDS: [RiskThreshold; 4] = [
    RiskThreshold::new(RiskLevel::Critical, Some(20), Some(150)),
    RiskThreshold::new(RiskLevel::High, Some(12), Some(80)),
    RiskThreshold::new(RiskLevel::Medium, Some(7), Some(40)),
    RiskThreshold::new(RiskLevel::Warning, Some(4), None),
];

/// Risk classifier backed by a threshold table.
///
/// Rows are kept sorted most severe first and the first matching row wins,
/// so when complexity and length point at different levels the more severe
/// one is reported. Anything that matches no row is SAFE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskTable {
    rows: Vec<RiskThreshold>,
}

impl Default for RiskTable {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLDS.to_vec())
    }
}

impl RiskTable {
    pub fn new(mut rows: Vec<RiskThreshold>) -> Self {
        rows.sort_by(|a, b| b.level.cmp(&a.level));
        Self { rows }
    }

    pub fn rows(&self) -> &[RiskThreshold] {
        &self.rows
    }

    /// Classify a function by both of its metrics.
    pub fn classify(&self, complexity: u32, length: usize) -> RiskLevel {
        self.lookup(Some(complexity), Some(length))
    }

    /// Classify by complexity alone.
    pub fn classify_complexity(&self, complexity: u32) -> RiskLevel {
        self.lookup(Some(complexity), None)
    }

    /// Classify by length alone.
    pub fn classify_length(&self, length: usize) -> RiskLevel {
        self.lookup(None, Some(length))
    }

    fn lookup(&self, complexity: Option<u32>, length: Option<usize>) -> RiskLevel {
        self.rows
            .iter()
            .find(|row| row.matches(complexity, length))
            .map(|row| row.level)
            .unwrap_or(RiskLevel::Safe)
    }
}
