#[cfg(test)]
mod tests;

use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::http::{build_agent, post_json};
use super::{GenerationError, TextGenerator};
use crate::config::ProviderConfig;

/// Client for the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiClient {
    base_url: Url,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl fmt::Debug for GeminiClient {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    #[inline]
    pub fn new(config: &ProviderConfig, api_key: &str) -> Result<Self> {
        let base_url = config
            .gemini_url()
            .context("Failed to parse Gemini base URL")?;

        Ok(Self {
            base_url,
            model: config.gemini_model.clone(),
            api_key: api_key.to_string(),
            agent: build_agent(config.request_timeout()),
        })
    }

    fn endpoint(&self) -> Result<Url, GenerationError> {
        self.base_url
            .join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| GenerationError::Transport(format!("invalid Gemini endpoint: {e}")))
    }
}

impl TextGenerator for GeminiClient {
    #[inline]
    fn model(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self.endpoint()?;
        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| GenerationError::Transport(format!("failed to encode request: {e}")))?;

        let response_text = post_json(
            &self.agent,
            url.as_str(),
            &[("x-goog-api-key", self.api_key.as_str())],
            &body,
        )?;

        let response: GenerateResponse = serde_json::from_str(&response_text)
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        extract_text(response)
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateResponse) -> Result<String, GenerationError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(GenerationError::MalformedResponse(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "candidate has no text parts".to_string(),
        ));
    }

    debug!("Gemini returned {} characters", text.len());
    Ok(text)
}
