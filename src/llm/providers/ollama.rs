use crate::config::LlmConfig;
use crate::llm::{IntentGenerator, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub struct OllamaProvider {
    client: reqwest::Client,
    api_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct OllamaRequest {
    model: String,
    system: String,
    prompt: String,
    format: &'static str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize, Debug)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    response: String,
    #[serde(default)]
    done: Option<bool>,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434/api/generate".to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    fn build_request(&self, system_prompt: &str, user_prompt: &str) -> OllamaRequest {
        OllamaRequest {
            model: self.model.clone(),
            system: system_prompt.to_string(),
            prompt: user_prompt.to_string(),
            format: "json",
            stream: false, // one JSON document, not a token stream
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl IntentGenerator for OllamaProvider {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        info!("Sending request to Ollama with model: {}", self.model);
        debug!("API URL: {}", self.api_url);

        let request = self.build_request(system_prompt, user_prompt);

        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = match response.text().await {
                Ok(body) => format!(" - Response body: {}", body),
                Err(_) => String::new(),
            };

            error!("Ollama API responded with status code: {}{}", status, error_body);
            return Err(LlmError::ResponseError(format!(
                "Ollama API responded with status code: {}{}",
                status, error_body
            )));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::ResponseError(format!("Failed to read response body: {}", e)))?;

        debug!("Raw response from Ollama: {}", response_text);

        let ollama_response = serde_json::from_str::<OllamaResponse>(&response_text).map_err(|e| {
            error!("Failed to parse Ollama response: {} - Response was: {}", e, response_text);
            LlmError::ResponseError(format!("Failed to parse Ollama response: {}", e))
        })?;

        if ollama_response.done == Some(false) {
            return Err(LlmError::ResponseError("Ollama returned a partial response".to_string()));
        }

        Ok(ollama_response.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LlmConfig {
        LlmConfig {
            backend: "ollama".to_string(),
            model: "llama3".to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn falls_back_to_local_endpoint() {
        let provider = OllamaProvider::new(&config()).unwrap();
        assert_eq!(provider.api_url, "http://localhost:11434/api/generate");

        let custom = LlmConfig {
            api_url: Some("http://gpu-box:11434/api/generate".to_string()),
            ..config()
        };
        assert_eq!(OllamaProvider::new(&custom).unwrap().api_url, "http://gpu-box:11434/api/generate");
    }

    #[test]
    fn request_is_json_mode_without_streaming() {
        let provider = OllamaProvider::new(&config()).unwrap();
        let body = serde_json::to_value(provider.build_request("SYSTEM", "Query: hi")).unwrap();
        assert_eq!(body["format"], "json");
        assert_eq!(body["stream"], false);
        assert_eq!(body["system"], "SYSTEM");
        assert_eq!(body["prompt"], "Query: hi");
        assert_eq!(body["model"], "llama3");
    }
}
