use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::IrrigationError;

/// A tool the delegated agent may use on the caller's behalf. The agent is an
/// opaque free-text oracle; this is the only surface it is told about.
#[derive(Debug, Clone, Copy)]
pub struct ToolCapability {
    pub name: &'static str,
    pub description: &'static str,
}

pub const TOOL_CAPABILITIES: &[ToolCapability] = &[
    ToolCapability {
        name: "weather_lookup",
        description: "look up live conditions and a short forecast for a whitelisted city",
    },
    ToolCapability {
        name: "moisture_prediction",
        description: "predict soil moisture from the recent sensor reading history",
    },
];

/// External LLM oracle for utterances the local pattern rules cannot handle.
/// No retry here: a provider or timeout failure maps to `AgentUnavailable` and
/// the router degrades the response.
#[async_trait]
pub trait LlmAgent: Send + Sync {
    async fn complete(
        &self,
        raw_text: &str,
        capabilities: &[ToolCapability],
    ) -> Result<String, IrrigationError>;
}

// ---------------------------------------------------------------------------
// OpenAI-compatible chat completions client
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone)]
pub struct OpenAiAgent {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiAgent {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("failed to build LLM HTTP client")?;
        Ok(Self {
            http,
            base_url: config.llm_base_url.clone(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
        })
    }

    fn system_prompt(capabilities: &[ToolCapability]) -> String {
        let mut lines = vec![
            "You are the conversational front-end of a smart-irrigation system.".to_owned(),
            "Answer the user's request concisely. You may call on these capabilities:".to_owned(),
        ];
        for cap in capabilities {
            lines.push(format!("- {}: {}", cap.name, cap.description));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl LlmAgent for OpenAiAgent {
    async fn complete(
        &self,
        raw_text: &str,
        capabilities: &[ToolCapability],
    ) -> Result<String, IrrigationError> {
        if self.api_key.is_empty() {
            return Err(IrrigationError::AgentUnavailable(
                "LLM API key not configured".to_owned(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, "Delegating utterance to LLM agent");

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_owned(),
                    content: Self::system_prompt(capabilities),
                },
                ChatMessage {
                    role: "user".to_owned(),
                    content: raw_text.to_owned(),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IrrigationError::AgentUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| IrrigationError::AgentUnavailable(e.to_string()))?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| IrrigationError::AgentUnavailable(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                IrrigationError::AgentUnavailable("provider returned no completion".to_owned())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_lists_every_capability() {
        let prompt = OpenAiAgent::system_prompt(TOOL_CAPABILITIES);
        assert!(prompt.contains("weather_lookup"));
        assert!(prompt.contains("moisture_prediction"));
    }

    #[test]
    fn chat_response_parses_first_choice() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "好的，这是一个笑话。"}}
            ]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).expect("valid payload");
        assert_eq!(parsed.choices[0].message.content, "好的，这是一个笑话。");
    }
}
