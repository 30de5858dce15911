// Answer module
// Prompt assembly, answer generation and follow-up suggestions

mod follow_up;
mod prompt;


use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::conversation::ConversationHistory;
use crate::llm::{GenerationError, Provider, ProviderRegistry};

pub use follow_up::{FollowUpSuggester, parse_follow_ups};
pub use prompt::{build_prompt, follow_up_prompt, render_context};

/// Text shown for an answer that could not be generated because the provider has no key
pub const MISSING_CLAUDE_KEY: &str = "❌ Claude API key missing. Please set it in .env.";

/// What the user sees for one question.
///
/// `text` is always displayable. When `failed` is set it holds an error sentinel
/// rather than model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub failed: bool,
}

/// Turns retrieved context plus conversation history into an answer from the selected provider
pub struct AnswerGenerator {
    registry: Arc<ProviderRegistry>,
    history_window: Option<usize>,
}

impl AnswerGenerator {
    #[inline]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            history_window: None,
        }
    }

    /// Only render the last `window` turns into the prompt
    #[inline]
    pub fn with_history_window(mut self, window: Option<usize>) -> Self {
        self.history_window = window;
        self
    }

    #[inline]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Never fails: provider errors come back as a failed [`Answer`] carrying sentinel text
    #[inline]
    pub fn generate<S: AsRef<str>>(
        &self,
        chunks: &[S],
        query: &str,
        history: &ConversationHistory,
        provider: Provider,
    ) -> Answer {
        let prompt = build_prompt(
            &render_context(chunks),
            &history.render_window(self.history_window),
            query,
        );
        debug!(
            "Generating answer with {} ({} chunks, {} prompt bytes)",
            provider,
            chunks.len(),
            prompt.len()
        );

        let result = self
            .registry
            .resolve(provider)
            .and_then(|generator| generator.generate(&prompt));

        match result {
            Ok(text) => Answer {
                text,
                failed: false,
            },
            Err(e) => {
                match &e {
                    GenerationError::MissingCredential { .. } => {
                        warn!("{} selected but no credential is configured", provider);
                    }
                    _ => error!("{} generation failed: {}", provider, e),
                }
                Answer {
                    text: failure_message(provider, &e),
                    failed: true,
                }
            }
        }
    }
}

/// User-visible sentinel text for a generation failure
#[inline]
pub fn failure_message(provider: Provider, error: &GenerationError) -> String {
    let family = provider.family();
    match error {
        GenerationError::MissingCredential { provider } => {
            format!("❌ {provider} API key missing. Please set it in .env.")
        }
        GenerationError::Transport(detail) => format!("❌ {family} API error: {detail}"),
        GenerationError::Status { status } => {
            format!("❌ {family} API error: HTTP status {status}")
        }
        GenerationError::MalformedResponse(_) => {
            format!("❌ Unexpected response format from {family} API.")
        }
    }
}
