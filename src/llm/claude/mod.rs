
use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::http::{build_agent, post_json};
use super::{ClaudeModel, GenerationError, TextGenerator};
use crate::config::ProviderConfig;

/// Returned when the first content block carries no `text` field
pub const NO_TEXT_FOUND: &str = "No text found";

/// Client for the Anthropic Messages API, bound to one model
#[derive(Clone)]
pub struct ClaudeClient {
    base_url: Url,
    model: String,
    api_key: String,
    api_version: String,
    max_tokens: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Option<Vec<ContentBlock>>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl fmt::Debug for ClaudeClient {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl ClaudeClient {
    #[inline]
    pub fn new(config: &ProviderConfig, api_key: &str, model: ClaudeModel) -> Result<Self> {
        let base_url = config
            .claude_url()
            .context("Failed to parse Claude base URL")?;

        Ok(Self {
            base_url,
            model: model.model_id().to_string(),
            api_key: api_key.to_string(),
            api_version: config.anthropic_version.clone(),
            max_tokens: config.claude_max_tokens,
            agent: build_agent(config.request_timeout()),
        })
    }

    #[inline]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

impl TextGenerator for ClaudeClient {
    #[inline]
    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self
            .base_url
            .join("v1/messages")
            .map_err(|e| GenerationError::Transport(format!("invalid Claude endpoint: {e}")))?;

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| GenerationError::Transport(format!("failed to encode request: {e}")))?;

        let response_text = post_json(
            &self.agent,
            url.as_str(),
            &[
                ("x-api-key", self.api_key.as_str()),
                ("anthropic-version", self.api_version.as_str()),
            ],
            &body,
        )?;

        let response: MessagesResponse = serde_json::from_str(&response_text)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        match response.content.unwrap_or_default().into_iter().next() {
            Some(block) => {
                let text = block.text.unwrap_or_else(|| NO_TEXT_FOUND.to_string());
                debug!("Claude returned {} characters", text.len());
                Ok(text)
            }
            None => Err(GenerationError::MalformedResponse(
                "response has no content blocks".to_string(),
            )),
        }
    }
}
