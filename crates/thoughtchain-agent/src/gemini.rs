use crate::collaborator::{NodeClassifier, ReplyGenerator, Verdict};
use crate::normalize::normalize_verdict;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thoughtchain_core::{Message, NodeView, Role, ThoughtchainError, ThoughtchainResult};
use tracing::debug;

/// Configuration for the Gemini collaborator backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for the Generative Language API.
    pub api_key: String,
    /// Model id, e.g. `gemini-2.5-flash`.
    #[serde(default = "default_model")]
    pub model: String,
    /// Override for the API base URL (used by tests).
    #[serde(default)]
    pub api_base_url: Option<String>,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

impl GeminiConfig {
    /// Creates a config for the given key with default model and base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: default_model(),
            api_base_url: None,
        }
    }

    fn base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com/v1beta")
    }
}

/// Gemini (Google Generative Language) backend implementing both
/// collaborator contracts.
pub struct GeminiBackend {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiBackend {
    /// Creates a backend with a fresh HTTP client.
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// One `generateContent` round trip, returning the concatenated text of
    /// the first candidate.
    async fn generate_content(&self, contents: Vec<serde_json::Value>) -> ThoughtchainResult<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url(),
            self.config.model
        );

        let body = serde_json::json!({ "contents": contents });

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ThoughtchainError::Http(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ThoughtchainError::QuotaExhausted);
        }

        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ThoughtchainError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(ThoughtchainError::Http(format!(
                "Gemini API error {status}: {resp_body}"
            )));
        }

        parse_gemini_response(&resp_body)
    }
}

fn user_part(text: &str) -> serde_json::Value {
    serde_json::json!({ "role": "user", "parts": [{ "text": text }] })
}

fn parse_gemini_response(body: &serde_json::Value) -> ThoughtchainResult<String> {
    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| {
            ThoughtchainError::Http("Missing candidates in Gemini response".into())
        })?;

    let text: Vec<&str> = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    Ok(text.join("\n"))
}

#[async_trait]
impl NodeClassifier for GeminiBackend {
    async fn classify(&self, message: &str, tree: &[NodeView]) -> ThoughtchainResult<Verdict> {
        let state = serde_json::to_string_pretty(tree)?;
        let prompt = format!(
            "You are a thought-chain agent helping students study by automatically \
             creating nodes for a mind-map. Decide whether a new node should be \
             created based on the user input and the current state of the mind-map.\n\
             Respond ONLY with a single valid JSON object with two keys:\n\
             - createNode: yes or no\n\
             - title: the title for the new node if yes, otherwise null\n\
             Make sure the response is parseable JSON. The current state is:\n{state}\n\n\
             User request:\n{message}\n"
        );

        let raw = self.generate_content(vec![user_part(&prompt)]).await?;
        debug!(raw = %raw, "classifier raw response");
        Ok(normalize_verdict(&raw))
    }
}

#[async_trait]
impl ReplyGenerator for GeminiBackend {
    async fn generate(&self, message: &str, history: &[Message]) -> ThoughtchainResult<String> {
        let mut contents: Vec<serde_json::Value> = history
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => "user",
                    Role::Bot => "model",
                };
                serde_json::json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();
        contents.push(user_part(message));

        self.generate_content(contents).await
    }
}
