#[cfg(test)]
mod tests;

use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const CLAUDE_API_KEY_VAR: &str = "CLAUDE_API_KEY";

/// API keys for the hosted text-generation providers.
///
/// The Gemini key is required: without it no answer can be generated and the process
/// refuses to start. The Claude key is optional; requests routed to Claude without it
/// return a sentinel message instead of calling the API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    google_api_key: String,
    claude_api_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0} is missing. Set it in the environment or in a .env file.")]
    Missing(&'static str),
    #[error("Failed to read .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}

impl Credentials {
    #[inline]
    pub fn new(
        google_api_key: impl Into<String>,
        claude_api_key: Option<String>,
    ) -> Result<Self, CredentialError> {
        let google_api_key = non_blank(Some(google_api_key.into()))
            .ok_or(CredentialError::Missing(GOOGLE_API_KEY_VAR))?;

        Ok(Self {
            google_api_key,
            claude_api_key: non_blank(claude_api_key),
        })
    }

    /// Load a `.env` file from the working directory (if any), then read the environment
    #[inline]
    pub fn load() -> Result<Self, CredentialError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => return Err(e.into()),
        }

        Self::from_env()
    }

    #[inline]
    pub fn from_env() -> Result<Self, CredentialError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from an arbitrary variable lookup
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let google_api_key = non_blank(lookup(GOOGLE_API_KEY_VAR))
            .ok_or(CredentialError::Missing(GOOGLE_API_KEY_VAR))?;

        let claude_api_key = non_blank(lookup(CLAUDE_API_KEY_VAR));
        if claude_api_key.is_none() {
            warn!(
                "{} is not set; requests routed to Claude will not be answered",
                CLAUDE_API_KEY_VAR
            );
        }

        Ok(Self {
            google_api_key,
            claude_api_key,
        })
    }

    #[inline]
    pub fn google_api_key(&self) -> &str {
        &self.google_api_key
    }

    #[inline]
    pub fn claude_api_key(&self) -> Option<&str> {
        self.claude_api_key.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("google_api_key", &"<redacted>")
            .field(
                "claude_api_key",
                &self.claude_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
