// LLM module
// Hosted text-generation providers behind one `generate(prompt)` capability

pub mod claude;
pub mod gemini;
mod http;
mod registry;


use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use registry::ProviderRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaudeModel {
    Haiku,
    Opus,
}

/// Which provider (and model) answers a request. Chosen per request; carries no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gemini,
    Claude(ClaudeModel),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{provider} API key missing")]
    MissingCredential { provider: &'static str },
    #[error("{0}")]
    Transport(String),
    #[error("HTTP status {status}")]
    Status { status: u16 },
    #[error("{0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
#[error("Unknown provider '{0}' (expected one of: gemini, claude-haiku, claude-opus)")]
pub struct ParseProviderError(String);

/// A remote text-generation endpoint
pub trait TextGenerator: Send + Sync {
    /// Model identifier sent to the provider
    fn model(&self) -> &str;

    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

impl ClaudeModel {
    pub const ALL: [ClaudeModel; 2] = [ClaudeModel::Haiku, ClaudeModel::Opus];

    #[inline]
    pub fn model_id(self) -> &'static str {
        match self {
            ClaudeModel::Haiku => "claude-3-haiku-20240307",
            ClaudeModel::Opus => "claude-3-opus-20240229",
        }
    }
}

impl Provider {
    pub const ALL: [Provider; 3] = [
        Provider::Gemini,
        Provider::Claude(ClaudeModel::Haiku),
        Provider::Claude(ClaudeModel::Opus),
    ];

    /// Provider family name used in user-visible messages
    #[inline]
    pub fn family(self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Claude(_) => "Claude",
        }
    }

    /// Human-readable label for selectors
    #[inline]
    pub fn label(self) -> String {
        match self {
            Provider::Gemini => "Gemini".to_string(),
            Provider::Claude(model) => format!("Claude ({})", model.model_id()),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Gemini => "gemini",
            Provider::Claude(ClaudeModel::Haiku) => "claude-haiku",
            Provider::Claude(ClaudeModel::Opus) => "claude-opus",
        })
    }
}

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "claude" | "claude-haiku" => Ok(Provider::Claude(ClaudeModel::Haiku)),
            "claude-opus" => Ok(Provider::Claude(ClaudeModel::Opus)),
            other => Err(ParseProviderError(other.to_string())),
        }
    }
}
