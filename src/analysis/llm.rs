use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use super::fallback::readme_template;
use super::{AnalysisError, AssessmentRequest, ReadinessAnalyzer};
use crate::config::Config;
use crate::report::types::{QualityBlock, ReadinessReport, SecuritySection, TechnicalDebt};

/// Score assigned to every dimension of a degraded report.
pub const DEGRADED_SCORE: u8 = 25;

const SYSTEM_PROMPT: &str = "You are a senior engineer reviewing a repository for production \
readiness. Reply with a single JSON object and nothing else.";

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fence pattern must compile")
});

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model endpoint rejected the credentials")]
    Unauthorized,

    #[error("Model endpoint is rate limiting requests")]
    RateLimited,

    #[error("Model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model response contained no choices")]
    EmptyResponse,
}

/// Anything that can turn a prompt into model text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier reported in results.
    fn model(&self) -> &str;

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpCompletionClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    fn model(&self) -> &str {
        &self.model
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: 0.2,
        };

        debug!(prompt_chars = prompt.len(), "sending completion request");
        let response = self
            .client
            .post(&self.endpoint)
            .header("User-Agent", "repo-readiness")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(LlmError::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let parsed = response.json::<ChatResponse>().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;
        debug!(response_chars = content.len(), "received completion");
        Ok(content)
    }
}

/// Readiness analysis delegated to a language model.
pub struct LlmAnalyzer<C> {
    client: C,
}

impl<C: CompletionClient> LlmAnalyzer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl LlmAnalyzer<HttpCompletionClient> {
    /// Build the HTTP-backed analyzer, or None when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, LlmError> {
        let Some(api_key) = config.api_key() else {
            return Ok(None);
        };
        let client = HttpCompletionClient::new(
            config.llm.endpoint.clone(),
            api_key,
            config.llm.model.clone(),
            Duration::from_secs(config.llm.timeout_secs),
        )?;
        Ok(Some(Self::new(client)))
    }
}

#[async_trait]
impl<C: CompletionClient> ReadinessAnalyzer for LlmAnalyzer<C> {
    fn name(&self) -> &str {
        self.client.model()
    }

    async fn assess(&self, request: &AssessmentRequest) -> Result<ReadinessReport, AnalysisError> {
        let prompt = build_prompt(request);
        let raw = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        Ok(parse_report(&raw, self.client.model(), &request.repo_name))
    }
}

fn build_prompt(request: &AssessmentRequest) -> String {
    let url = request.repo_url.as_deref().unwrap_or("(local checkout)");
    format!(
        "Assess the repository \"{name}\" ({url}) for production readiness.\n\
         Respond with JSON using exactly these keys:\n\
         {{\n\
           \"readinessScore\": 0-100,\n\
           \"summary\": string,\n\
           \"codeQuality\": {{\"score\": 0-100, \"strengths\": [string], \"issues\": [string]}},\n\
           \"documentation\": {{\"score\": 0-100, \"strengths\": [string], \"issues\": [string]}},\n\
           \"testing\": {{\"score\": 0-100, \"strengths\": [string], \"issues\": [string]}},\n\
           \"security\": {{\"score\": 0-100, \"concerns\": [string], \"recommendations\": [string]}},\n\
           \"technicalDebt\": {{\"level\": \"low\"|\"moderate\"|\"high\", \"items\": [string], \"estimatedEffort\": string}},\n\
           \"suggestedReadme\": markdown string\n\
         }}\n\n\
         Repository contents:\n{text}",
        name = request.repo_name,
        url = url,
        text = request.merged_text,
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelReport {
    readiness_score: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    code_quality: ModelBlock,
    #[serde(default)]
    documentation: ModelBlock,
    #[serde(default)]
    testing: ModelBlock,
    #[serde(default)]
    security: ModelSecurity,
    #[serde(default)]
    technical_debt: TechnicalDebt,
    #[serde(default)]
    suggested_readme: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelBlock {
    score: f64,
    strengths: Vec<String>,
    issues: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelSecurity {
    score: f64,
    concerns: Vec<String>,
    recommendations: Vec<String>,
}

fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

impl From<ModelBlock> for QualityBlock {
    fn from(block: ModelBlock) -> Self {
        QualityBlock {
            score: clamp_score(block.score),
            strengths: block.strengths,
            issues: block.issues,
        }
    }
}

/// Pull the JSON object out of model text that may be fenced or padded
/// with prose.
fn extract_json(raw: &str) -> Option<&str> {
    let candidate = FENCED_BLOCK
        .captures(raw)
        .and_then(|c| c.get(1))
        .map_or(raw, |m| m.as_str());
    let start = candidate.find('{')?;
    let end = candidate.rfind('}')?;
    (start < end).then(|| &candidate[start..=end])
}

/// Turn model text into a report. Unparseable text yields a degraded report
/// instead of an error.
pub fn parse_report(raw: &str, model: &str, repo_name: &str) -> ReadinessReport {
    let parsed = extract_json(raw)
        .ok_or_else(|| "no JSON object in response".to_string())
        .and_then(|json| serde_json::from_str::<ModelReport>(json).map_err(|e| e.to_string()));

    match parsed {
        Ok(report) => {
            let suggested_readme = if report.suggested_readme.trim().is_empty() {
                readme_template(repo_name)
            } else {
                report.suggested_readme
            };
            ReadinessReport {
                readiness_score: clamp_score(report.readiness_score),
                model: model.to_string(),
                summary: report.summary,
                code_quality: report.code_quality.into(),
                documentation: report.documentation.into(),
                testing: report.testing.into(),
                security: SecuritySection {
                    score: clamp_score(report.security.score),
                    concerns: report.security.concerns,
                    recommendations: report.security.recommendations,
                },
                technical_debt: report.technical_debt,
                suggested_readme,
                error: None,
            }
        }
        Err(reason) => {
            tracing::warn!(%reason, "model response could not be parsed, using degraded report");
            degraded_report(model, repo_name, &reason)
        }
    }
}

/// Fixed low-confidence report used when the model answered with something
/// that is not the expected JSON.
pub fn degraded_report(model: &str, repo_name: &str, reason: &str) -> ReadinessReport {
    let unavailable = |what: &str| QualityBlock {
        score: DEGRADED_SCORE,
        strengths: vec![],
        issues: vec![format!("{what} could not be assessed")],
    };
    ReadinessReport {
        readiness_score: DEGRADED_SCORE,
        model: model.to_string(),
        summary: "The analysis response could not be parsed; scores are low-confidence placeholders."
            .to_string(),
        code_quality: unavailable("Code quality"),
        documentation: unavailable("Documentation"),
        testing: unavailable("Testing"),
        security: SecuritySection {
            score: DEGRADED_SCORE,
            concerns: vec!["Security could not be assessed".to_string()],
            recommendations: vec![],
        },
        technical_debt: TechnicalDebt {
            level: "unknown".to_string(),
            items: vec![],
            estimated_effort: "unknown".to_string(),
        },
        suggested_readme: readme_template(repo_name),
        error: Some(format!("unparseable model response: {reason}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{StubClient, VALID_ANSWER};

    fn request() -> AssessmentRequest {
        AssessmentRequest {
            repo_name: "demo".to_string(),
            repo_url: Some("https://github.com/org/demo".to_string()),
            merged_text: "# README\nfn main() {}".to_string(),
        }
    }

    #[test]
    fn test_extract_json_variants() {
        assert_eq!(extract_json("{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(extract_json("Sure! {\"a\":1} hope it helps"), Some("{\"a\":1}"));
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn test_parse_valid_report_clamps_scores() {
        let report = parse_report(VALID_ANSWER, "stub-model", "demo");
        assert_eq!(report.readiness_score, 82);
        assert_eq!(report.documentation.score, 100);
        assert_eq!(report.testing.score, 70);
        assert!(report.testing.strengths.is_empty());
        assert_eq!(report.technical_debt.estimated_effort, "2 days");
        assert_eq!(report.model, "stub-model");
        assert!(report.error.is_none());
    }

    #[test]
    fn test_parse_failure_yields_degraded_report() {
        let report = parse_report("I cannot help with that.", "stub-model", "demo");
        assert_eq!(report.readiness_score, DEGRADED_SCORE);
        assert_eq!(report.code_quality.score, DEGRADED_SCORE);
        assert!(report.error.as_deref().unwrap().contains("unparseable"));
        assert_eq!(report.model, "stub-model");
    }

    #[test]
    fn test_missing_required_score_is_degraded() {
        let report = parse_report("{\"summary\": \"no score\"}", "m", "demo");
        assert!(report.error.is_some());
    }

    #[test]
    fn test_prompt_names_repository_and_keys() {
        let prompt = build_prompt(&request());
        assert!(prompt.contains("\"demo\""));
        assert!(prompt.contains("https://github.com/org/demo"));
        assert!(prompt.contains("\"technicalDebt\""));
        assert!(prompt.ends_with("fn main() {}"));
    }

    #[tokio::test]
    async fn test_analyzer_uses_injected_client() {
        let analyzer = LlmAnalyzer::new(StubClient::answering(VALID_ANSWER));
        let report = analyzer.assess(&request()).await.unwrap();
        assert_eq!(report.readiness_score, 82);
        assert_eq!(analyzer.client.prompts.lock().unwrap().len(), 1);
        assert_eq!(analyzer.name(), "stub-model");
    }

    #[tokio::test]
    async fn test_analyzer_propagates_client_failure() {
        let analyzer = LlmAnalyzer::new(StubClient::failing(|| LlmError::RateLimited));
        let err = analyzer.assess(&request()).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Model(LlmError::RateLimited)));
    }

    #[test]
    fn test_from_config_without_key_is_none() {
        let mut config = Config::default();
        config.llm.api_key = Some(String::new());
        assert!(LlmAnalyzer::from_config(&config).unwrap().is_none());
    }

    mod http {
        use super::super::*;
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        async fn client_for(server: &MockServer) -> HttpCompletionClient {
            HttpCompletionClient::new(
                format!("{}/v1/chat/completions", server.uri()),
                "secret",
                "test-model",
                Duration::from_secs(5),
            )
            .unwrap()
        }

        #[tokio::test]
        async fn test_returns_first_choice_content() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .and(header("authorization", "Bearer secret"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "choices": [{"message": {"content": "{\"readinessScore\": 10}"}}]
                })))
                .mount(&server)
                .await;

            let content = client_for(&server).await.complete("sys", "prompt").await.unwrap();
            assert_eq!(content, "{\"readinessScore\": 10}");
        }

        #[tokio::test]
        async fn test_maps_auth_and_rate_limit_statuses() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(401))
                .up_to_n_times(1)
                .mount(&server)
                .await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(429))
                .mount(&server)
                .await;

            let client = client_for(&server).await;
            assert!(matches!(client.complete("s", "p").await, Err(LlmError::Unauthorized)));
            assert!(matches!(client.complete("s", "p").await, Err(LlmError::RateLimited)));
        }

        #[tokio::test]
        async fn test_empty_choices() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
                )
                .mount(&server)
                .await;

            let result = client_for(&server).await.complete("s", "p").await;
            assert!(matches!(result, Err(LlmError::EmptyResponse)));
        }
    }
}
