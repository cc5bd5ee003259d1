// Oracle Interfaces
// The engine never performs retrieval or model inference itself; it
// consumes an embedding oracle and a document-level semantic judge
// behind these traits. Implementations can be swapped (HTTP-backed,
// cached, or test stub) without touching aggregation logic.

use crate::models::SemanticJudgment;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

const EMBEDDING_DEFAULT_URL: &str = "https://api.openai.com/v1/embeddings";
const JUDGE_DEFAULT_URL: &str = "https://api.deepseek.com/chat/completions";
const ORACLE_TIMEOUT_SECS: u64 = 60;

const JUDGE_SYSTEM_PROMPT: &str = r#"You are an academic-integrity reviewer. Compare the two submitted texts and decide how semantically similar they are and whether one plagiarizes the other.

Return JSON only, with these fields:
- semanticSimilarity: number between 0.000 and 1.000
- isPlagiarism: boolean
- rationale: one short paragraph explaining the judgment
- sharedConcepts: array of short strings naming concepts both texts share

Return the JSON object and nothing else."#;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured")]
    MissingApiKey,
    #[error("oracle unavailable")]
    Unavailable,
}

/// Sentence embedding oracle. May be unavailable; must not fail loudly —
/// `None` means "no embedding for this text".
#[allow(async_fn_in_trait)]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Option<Vec<f64>>;
}

/// Document-level semantic judge oracle. Errors are expected and are
/// absorbed by the caller (the comparison degrades, the run continues).
#[allow(async_fn_in_trait)]
pub trait SemanticJudge: Send + Sync {
    async fn judge(&self, text_a: &str, text_b: &str) -> Result<SemanticJudgment, OracleError>;
}

/// Always-unavailable embedder. Default when no API key is configured;
/// the engine then degrades every semantic channel to lexical similarity.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEmbedder;

impl Embedder for NullEmbedder {
    async fn embed(&self, _text: &str) -> Option<Vec<f64>> {
        None
    }
}

/// Always-failing judge. Its weight is excluded from the document-level
/// denominator rather than contributing a zero score.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSemanticJudge;

impl SemanticJudge for NullSemanticJudge {
    async fn judge(&self, _a: &str, _b: &str) -> Result<SemanticJudgment, OracleError> {
        Err(OracleError::Unavailable)
    }
}

// ============ HTTP-backed implementations ============

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    data: Option<Vec<EmbeddingData>>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Option<Vec<f64>>,
}

/// Embedding oracle over an OpenAI-compatible embeddings endpoint.
pub struct HttpEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: String,
}

impl HttpEmbedder {
    pub fn new(model: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(ORACLE_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        let url = env::var("VERITEXT_EMBEDDING_URL")
            .unwrap_or_else(|_| EMBEDDING_DEFAULT_URL.to_string());

        Self {
            client,
            url,
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Build from environment; `None` when no key is configured.
    pub fn from_env() -> Option<Self> {
        let api_key = get_api_key("embedding")?;
        let model = env::var("VERITEXT_EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());
        Some(Self::new(&model, &api_key))
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f64>, OracleError> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| OracleError::JsonError(e.to_string()))?;

        debug!(
            latency_ms = start.elapsed().as_millis() as i64,
            "embedding oracle ok"
        );

        data.data
            .and_then(|d| d.into_iter().next())
            .and_then(|d| d.embedding)
            .ok_or(OracleError::MissingContent)
    }
}

impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Option<Vec<f64>> {
        match self.request_embedding(text).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!("embedding oracle failed: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Semantic judge over an OpenAI-compatible chat-completions endpoint.
pub struct HttpSemanticJudge {
    client: Client,
    url: String,
    model: String,
    api_key: String,
}

impl HttpSemanticJudge {
    pub fn new(model: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(ORACLE_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        let url =
            env::var("VERITEXT_JUDGE_URL").unwrap_or_else(|_| JUDGE_DEFAULT_URL.to_string());

        Self {
            client,
            url,
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_env() -> Option<Self> {
        let api_key = get_api_key("judge")?;
        let model =
            env::var("VERITEXT_JUDGE_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string());
        Some(Self::new(&model, &api_key))
    }

    async fn call_judge(&self, text_a: &str, text_b: &str) -> Result<SemanticJudgment, OracleError> {
        let user_prompt = format!("TEXT A:\n{}\n\nTEXT B:\n{}", text_a, text_b);
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: JUDGE_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt,
                },
            ],
            max_tokens: 512,
            temperature: 0.0,
        };

        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::JsonError(e.to_string()))?;

        let content = data
            .choices
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or(OracleError::MissingContent)?;

        debug!(
            latency_ms = start.elapsed().as_millis() as i64,
            "semantic judge ok"
        );

        let json_str = extract_json(&content)?;
        let mut judgment: SemanticJudgment = serde_json::from_str(&json_str)
            .map_err(|e| OracleError::JsonError(e.to_string()))?;
        judgment.semantic_similarity = judgment.semantic_similarity.clamp(0.0, 1.0);
        Ok(judgment)
    }
}

impl SemanticJudge for HttpSemanticJudge {
    async fn judge(&self, text_a: &str, text_b: &str) -> Result<SemanticJudgment, OracleError> {
        self.call_judge(text_a, text_b).await
    }
}

// Absent oracles behave like their Null counterparts, so callers can
// hold one engine type whether or not keys are configured.
impl Embedder for Option<HttpEmbedder> {
    async fn embed(&self, text: &str) -> Option<Vec<f64>> {
        match self {
            Some(embedder) => embedder.embed(text).await,
            None => None,
        }
    }
}

impl SemanticJudge for Option<HttpSemanticJudge> {
    async fn judge(&self, text_a: &str, text_b: &str) -> Result<SemanticJudgment, OracleError> {
        match self {
            Some(judge) => judge.judge(text_a, text_b).await,
            None => Err(OracleError::Unavailable),
        }
    }
}

/// Extract the JSON object from a model reply that may wrap it in prose.
fn extract_json(content: &str) -> Result<String, OracleError> {
    let content = content.trim();
    if content.starts_with('{') {
        return Ok(content.to_string());
    }
    match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if end > start => Ok(content[start..=end].to_string()),
        _ => Err(OracleError::JsonError("no JSON object in reply".to_string())),
    }
}

/// Resolve an oracle API key from the environment.
pub fn get_api_key(oracle: &str) -> Option<String> {
    let env_keys: &[&str] = match oracle {
        "embedding" => &["VERITEXT_EMBEDDING_API_KEY", "OPENAI_API_KEY"],
        "judge" => &["VERITEXT_JUDGE_API_KEY", "DEEPSEEK_API_KEY"],
        _ => &[],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let raw = r#"{"semanticSimilarity": 0.91}"#;
        assert_eq!(extract_json(raw).unwrap(), raw);
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let raw = "Here is the result:\n{\"semanticSimilarity\": 0.42}\nDone.";
        let json = extract_json(raw).unwrap();
        let parsed: SemanticJudgment = serde_json::from_str(&json).unwrap();
        assert!((parsed.semantic_similarity - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_extract_json_missing() {
        assert!(extract_json("no structured content").is_err());
    }

    #[tokio::test]
    async fn test_null_embedder_is_unavailable() {
        assert!(NullEmbedder.embed("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_null_judge_fails_soft() {
        let err = NullSemanticJudge.judge("a", "b").await.unwrap_err();
        assert!(matches!(err, OracleError::Unavailable));
    }
}
