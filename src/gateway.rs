//! LLM gateway: one "generate reply" capability with fixed grounding rules.
//!
//! [`LlmGateway`] builds the outgoing request (system instruction with the
//! context blob embedded, history with error artifacts filtered out, the new
//! user turn last, temperature pinned to 0) and forwards it to a
//! [`ChatBackend`]. The shipped backend is [`GeminiBackend`], which calls the
//! Gemini `generateContent` REST API via `reqwest`. No retry: a failed
//! request surfaces once as [`GatewayError`] and the orchestrator converts
//! it into a flagged chat message.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::GatewayConfig;
use crate::models::{Message, Role};
use crate::prompts;

/// Environment variables checked for the API key, in order.
const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Fatal configuration error: raised at construction, before any request.
    #[error("API key not configured: set GEMINI_API_KEY (or API_KEY)")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("backend returned no usable text")]
    NoText,
}

/// One role-tagged turn forwarded to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// A fully assembled generation request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system_instruction: String,
    pub turns: Vec<Turn>,
    pub temperature: f32,
}

/// The backend capability: accept a request, return generated text or fail.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn generate(&self, request: &ChatRequest) -> Result<String, GatewayError>;
}

/// Gateway wrapping a backend with the fixed grounding system instruction.
pub struct LlmGateway {
    backend: Arc<dyn ChatBackend>,
    model: String,
}

impl LlmGateway {
    pub fn new(model: impl Into<String>, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    /// Build the request for one user message and await the backend once.
    ///
    /// `history` is the conversation so far, excluding `user_text` itself.
    /// Assistant messages flagged `is_error` are UI artifacts, not real model
    /// turns, and are filtered out before forwarding.
    pub async fn generate_reply(
        &self,
        user_text: &str,
        grounding_context: &str,
        history: &[Message],
    ) -> Result<String, GatewayError> {
        let request = self.build_request(user_text, grounding_context, history);
        self.backend.generate(&request).await
    }

    fn build_request(
        &self,
        user_text: &str,
        grounding_context: &str,
        history: &[Message],
    ) -> ChatRequest {
        let mut turns: Vec<Turn> = history
            .iter()
            .filter(|m| m.role != Role::Assistant || !m.is_error)
            .map(|m| Turn {
                role: m.role,
                text: m.content.clone(),
            })
            .collect();
        turns.push(Turn {
            role: Role::User,
            text: user_text.to_string(),
        });

        ChatRequest {
            model: self.model.clone(),
            system_instruction: prompts::system_instruction(grounding_context),
            turns,
            // Zero temperature to bias toward literal grounding.
            temperature: 0.0,
        }
    }
}

// ============ Gemini Backend ============

/// Backend calling `POST /v1beta/models/{model}:generateContent`.
#[derive(Debug)]
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiBackend {
    /// Create the backend, resolving the API key from config or environment.
    ///
    /// A missing key is a fatal configuration error raised here, before any
    /// request is attempted.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| {
                API_KEY_VARS
                    .iter()
                    .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
            })
            .ok_or(GatewayError::MissingApiKey)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn generate(&self, request: &ChatRequest) -> Result<String, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );
        let body = build_request_body(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = response.json().await?;
        parse_response(&json)
    }
}

fn gemini_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

/// Build the `generateContent` JSON body for a request.
fn build_request_body(request: &ChatRequest) -> Value {
    let contents: Vec<Value> = request
        .turns
        .iter()
        .map(|t| {
            serde_json::json!({
                "role": gemini_role(t.role),
                "parts": [{ "text": t.text }],
            })
        })
        .collect();

    serde_json::json!({
        "contents": contents,
        "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
        "generationConfig": { "temperature": request.temperature },
    })
}

/// Extract the reply text from a `generateContent` response.
///
/// Joins the text parts of the first candidate; a missing candidate or an
/// all-whitespace reply is "no usable text" and fails.
fn parse_response(json: &Value) -> Result<String, GatewayError> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or(GatewayError::NoText)?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(GatewayError::NoText);
    }
    Ok(text)
}
