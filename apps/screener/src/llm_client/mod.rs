//! LLM Client: the single point of entry for all inference calls in the screener.
//!
//! No other module may talk to an inference endpoint directly.
//! Every call is a single attempt: no retries, no backoff. Callers receive an
//! empty map on any failure and decide what a missing field means.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{LlmConfig, LlmProvider};

pub mod prompts;

/// Low temperature keeps structuring and scoring analytic rather than creative.
pub const TEMPERATURE: f32 = 0.1;

/// Untyped JSON object as returned by the model.
pub type JsonMap = Map<String, Value>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response is missing the generated text field")]
    MissingContent,

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model returned JSON that is not an object")]
    NotAnObject,
}

/// Inference seam. Never fails: an empty map stands for "nothing usable came back".
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn call_json(&self, prompt: &str, system: &str) -> JsonMap;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire formats
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    format: &'a str,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ResponseFormat {
    #[serde(rename = "json_object")]
    JsonObject,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
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

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// The inference client shared by the structurer and the evaluator.
/// Speaks the Ollama generate API or any OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(300))
                .build()?,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Makes one call and returns the model's raw text payload.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        match self.config.provider {
            LlmProvider::Ollama => self.call_ollama(prompt, system).await,
            LlmProvider::OpenAi | LlmProvider::Gemini => self.call_chat(prompt, system).await,
        }
    }

    /// Calls the model and parses its payload as a JSON object.
    pub async fn try_call_json(&self, prompt: &str, system: &str) -> Result<JsonMap, LlmError> {
        let text = self.call(prompt, system).await?;
        parse_json_object(&text)
    }

    async fn call_ollama(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        let body = OllamaRequest {
            model: &self.config.model,
            prompt,
            system,
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: TEMPERATURE,
            },
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let response: OllamaResponse = check_status(response).await?.json().await?;
        response.response.ok_or(LlmError::MissingContent)
    }

    async fn call_chat(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            response_format: ResponseFormat::JsonObject,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let response: ChatResponse = check_status(response).await?.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::MissingContent)
    }
}

#[async_trait]
impl LlmGateway for LlmClient {
    async fn call_json(&self, prompt: &str, system: &str) -> JsonMap {
        match self.try_call_json(prompt, system).await {
            Ok(map) => {
                debug!("LLM call succeeded: {} keys returned", map.len());
                map
            }
            Err(e) => {
                warn!("LLM call failed, returning empty result: {e}");
                JsonMap::new()
            }
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Parses the model's text payload. Only a JSON object counts as a result.
fn parse_json_object(text: &str) -> Result<JsonMap, LlmError> {
    match serde_json::from_str::<Value>(strip_json_fences(text))? {
        Value::Object(map) => Ok(map),
        _ => Err(LlmError::NotAnObject),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Gateway double that replays canned maps in order and records every prompt.
    /// Once the script runs out it behaves like a failed call.
    #[derive(Default)]
    pub struct ScriptedLlm {
        replies: Mutex<VecDeque<JsonMap>>,
        pub prompts: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedLlm {
        pub fn new(replies: Vec<Value>) -> Self {
            let replies = replies
                .into_iter()
                .map(|v| match v {
                    Value::Object(map) => map,
                    _ => JsonMap::new(),
                })
                .collect();
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedLlm {
        async fn call_json(&self, prompt: &str, system: &str) -> JsonMap {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), system.to_string()));
            self.replies.lock().unwrap().pop_front().unwrap_or_default()
        }
    }
}
