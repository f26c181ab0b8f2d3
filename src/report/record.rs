use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::{
    Assessment, QualityBlock, RepositoryAnalysis, SecuritySection, TechnicalDebt,
};

/// Flat document for persisting one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub analysis_id: Uuid,
    pub repo_name: String,
    pub repo_url: Option<String>,
    pub readiness_score: u8,
    pub model: String,
    pub summary: String,
    pub code_quality: QualityBlock,
    pub documentation: QualityBlock,
    pub testing: QualityBlock,
    pub security: SecuritySection,
    pub technical_debt: TechnicalDebt,
    pub suggested_readme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub overall_score: u8,
    pub repository_analysis: RepositoryAnalysis,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(assessment: &Assessment) -> Self {
        Self::at(assessment, Uuid::new_v4(), Utc::now())
    }

    fn at(assessment: &Assessment, analysis_id: Uuid, created_at: DateTime<Utc>) -> Self {
        let readiness = &assessment.readiness;
        Self {
            analysis_id,
            repo_name: assessment.repo_name.clone(),
            repo_url: assessment.repo_url.clone(),
            readiness_score: readiness.readiness_score,
            model: readiness.model.clone(),
            summary: readiness.summary.clone(),
            code_quality: readiness.code_quality.clone(),
            documentation: readiness.documentation.clone(),
            testing: readiness.testing.clone(),
            security: readiness.security.clone(),
            technical_debt: readiness.technical_debt.clone(),
            suggested_readme: readiness.suggested_readme.clone(),
            error: readiness.error.clone(),
            overall_score: assessment.analysis.overall_score,
            repository_analysis: assessment.analysis.clone(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_assessment;

    #[test]
    fn test_record_copies_scores() {
        let assessment = sample_assessment();
        let record = AnalysisRecord::new(&assessment);
        assert_eq!(record.repo_name, "org/demo");
        assert_eq!(record.readiness_score, assessment.readiness.readiness_score);
        assert_eq!(record.overall_score, assessment.analysis.overall_score);
        assert_eq!(record.model, assessment.readiness.model);
        assert_eq!(record.analysis_id.get_version_num(), 4);
    }

    #[test]
    fn test_records_get_distinct_ids() {
        let assessment = sample_assessment();
        let a = AnalysisRecord::new(&assessment);
        let b = AnalysisRecord::new(&assessment);
        assert_ne!(a.analysis_id, b.analysis_id);
    }

    #[test]
    fn test_record_json_keys() {
        let created = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let record = AnalysisRecord::at(&sample_assessment(), Uuid::nil(), created);
        let json = serde_json::to_value(&record).unwrap();

        for key in [
            "analysisId",
            "repoName",
            "repoUrl",
            "readinessScore",
            "model",
            "codeQuality",
            "technicalDebt",
            "overallScore",
            "createdAt",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert!(json.get("error").is_none());
        assert_eq!(json["createdAt"], "2024-05-01T12:00:00Z");
        assert_eq!(json["analysisId"], "00000000-0000-0000-0000-000000000000");
    }
}
