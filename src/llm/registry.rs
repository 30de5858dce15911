use anyhow::{Context, Result};
use std::collections::HashMap;
use tracing::debug;

use super::{ClaudeClient, ClaudeModel, GeminiClient, GenerationError, Provider, TextGenerator};
use crate::config::{Credentials, ProviderConfig};

/// One generator per selectable provider variant.
///
/// Gemini is always present: its credential is required at startup. Claude models
/// are only registered when a Claude key is configured, so resolving them without
/// one yields [`GenerationError::MissingCredential`] and no request is attempted.
pub struct ProviderRegistry {
    gemini: Box<dyn TextGenerator>,
    claude: HashMap<ClaudeModel, Box<dyn TextGenerator>>,
}

impl ProviderRegistry {
    #[inline]
    pub fn new(gemini: Box<dyn TextGenerator>) -> Self {
        Self {
            gemini,
            claude: HashMap::new(),
        }
    }

    #[inline]
    pub fn with_claude(mut self, model: ClaudeModel, generator: Box<dyn TextGenerator>) -> Self {
        self.claude.insert(model, generator);
        self
    }

    /// Build HTTP clients for every provider the credentials allow
    #[inline]
    pub fn from_config(config: &ProviderConfig, credentials: &Credentials) -> Result<Self> {
        let gemini = GeminiClient::new(config, credentials.google_api_key())
            .context("Failed to configure Gemini client")?;
        let mut registry = Self::new(Box::new(gemini));

        if let Some(key) = credentials.claude_api_key() {
            for model in ClaudeModel::ALL {
                let client = ClaudeClient::new(config, key, model)
                    .context("Failed to configure Claude client")?;
                registry = registry.with_claude(model, Box::new(client));
            }
        }

        debug!(
            "Provider registry ready (Claude models: {})",
            registry.claude.len()
        );
        Ok(registry)
    }

    #[inline]
    pub fn resolve(&self, provider: Provider) -> Result<&dyn TextGenerator, GenerationError> {
        match provider {
            Provider::Gemini => Ok(self.gemini.as_ref()),
            Provider::Claude(model) => self
                .claude
                .get(&model)
                .map(|generator| &**generator)
                .ok_or(GenerationError::MissingCredential { provider: "Claude" }),
        }
    }

    /// Generator used for follow-up suggestions
    #[inline]
    pub fn primary(&self) -> &dyn TextGenerator {
        self.gemini.as_ref()
    }

    #[inline]
    pub fn is_available(&self, provider: Provider) -> bool {
        self.resolve(provider).is_ok()
    }
}
