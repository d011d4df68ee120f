use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};

use crate::config::RemoteConfig;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// One completion request: the user's instruction plus the surfaces it may
/// address, under a fixed system prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub instruction: String,
    pub surface_names: Vec<String>,
    pub system_prompt: String,
}

impl ModelRequest {
    pub fn user_message(&self) -> String {
        let surfaces = serde_json::to_string(&self.surface_names).unwrap_or_else(|_| "[]".to_string());
        format!(
            "Available surfaces: {surfaces}\nInstruction: {}",
            self.instruction.trim()
        )
    }
}

/// Language-model transport. Returns the raw reply text; interpreting it is
/// the caller's job.
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;
    fn complete(&self, request: &ModelRequest) -> Result<String>;
}

/// Anthropic Messages API client.
pub struct AnthropicMessages {
    api_base: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    http: HttpClient,
}

impl AnthropicMessages {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let Some(api_key) = config.api_key.clone() else {
            bail!("ANTHROPIC_API_KEY is not set");
        };
        let mut builder = HttpClient::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("HTTP client setup failed")?;
        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.api_base)
    }

    fn payload(&self, request: &ModelRequest) -> Value {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": request.system_prompt,
            "messages": [{"role": "user", "content": request.user_message()}],
        })
    }
}

impl LanguageModel for AnthropicMessages {
    fn name(&self) -> &str {
        &self.model
    }

    fn complete(&self, request: &ModelRequest) -> Result<String> {
        let endpoint = self.endpoint();
        let response = self
            .http
            .post(&endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.payload(request))
            .send()
            .with_context(|| format!("Anthropic request failed ({endpoint})"))?;
        let payload = response_json_or_error("Anthropic", response)?;
        reply_text(&payload)
    }
}

/// Concatenated `content[].text` of a Messages API reply.
fn reply_text(payload: &Value) -> Result<String> {
    let Some(blocks) = payload.get("content").and_then(Value::as_array) else {
        bail!("Anthropic reply has no content: {}", truncate_text(&payload.to_string(), 256));
    };
    let text: String = blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str).unwrap_or("text") == "text")
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<&str>>()
        .join("");
    if text.trim().is_empty() {
        bail!("Anthropic reply has no text blocks");
    }
    Ok(text)
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, 512)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

pub(crate) fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() || parts.last().is_some_and(|existing| existing == trimmed) {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
