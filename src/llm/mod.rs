pub mod prompt;
pub mod providers;

use crate::config::LlmConfig;
use crate::schema::EmployeeSchema;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "LLM connection error: {}", msg),
            LlmError::ResponseError(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
        }
    }
}

impl Error for LlmError {}

/// A hosted model that answers a system + user prompt with (ideally) JSON text.
#[async_trait]
pub trait IntentGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

pub struct LlmManager {
    generator: Box<dyn IntentGenerator + Send + Sync>,
    backend: String,
    system_prompt: String,
}

impl LlmManager {
    pub fn new(config: &LlmConfig, schema: &EmployeeSchema) -> Result<Self, LlmError> {
        let generator: Box<dyn IntentGenerator + Send + Sync> = match config.backend.as_str() {
            "remote" => Box::new(providers::remote::RemoteLlmProvider::new(config)?),
            "ollama" => Box::new(providers::ollama::OllamaProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )));
            }
        };

        Ok(Self::with_generator(generator, &config.backend, schema))
    }

    pub fn with_generator(
        generator: Box<dyn IntentGenerator + Send + Sync>,
        backend: &str,
        schema: &EmployeeSchema,
    ) -> Self {
        Self {
            generator,
            backend: backend.to_string(),
            system_prompt: prompt::build_system_prompt(schema),
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Classifies a question. Never fails: any problem with the model comes
    /// back as an `unsupported` classification carrying the diagnostic.
    pub async fn classify(&self, query: &str, context_names: &[String]) -> Value {
        let user_prompt = prompt::build_user_prompt(query, context_names);
        debug!("Classifying with {} context names", context_names.len());

        let content = match self.generator.generate(&self.system_prompt, &user_prompt).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Intent classification failed: {}", e);
                return unsupported(format!("Intent classification failed: {}", e));
            }
        };
        debug!("Raw classification: {}", content);

        match parse_classification(&content) {
            Ok(value) => {
                info!("Classified intent: {}", value["intent"]);
                value
            }
            Err(e) => {
                warn!("Unusable classification: {} - Response was: {}", e, content);
                unsupported(format!("Could not understand the model response: {}", e))
            }
        }
    }
}

fn unsupported(reason: String) -> Value {
    json!({ "intent": "unsupported", "reason": reason })
}

/// Pulls the JSON object out of a model reply, which may be bare JSON,
/// a fenced code block, or JSON surrounded by prose.
pub fn extract_json(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed);
    }

    let fence = regex::Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok()?;
    if let Some(captures) = fence.captures(trimmed) {
        if let Some(body) = captures.get(1) {
            return Some(body.as_str());
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    (start < end).then(|| &trimmed[start..=end])
}

/// A classification must be a JSON object with a string `intent`.
pub fn parse_classification(content: &str) -> Result<Value, LlmError> {
    let body = extract_json(content)
        .ok_or_else(|| LlmError::ResponseError("no JSON object in response".to_string()))?;
    let value: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::ResponseError(format!("invalid JSON: {}", e)))?;

    match value.get("intent") {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(value),
        Some(_) => Err(LlmError::ResponseError("'intent' is not a string".to_string())),
        None => Err(LlmError::ResponseError("missing 'intent' field".to_string())),
    }
}
