use std::sync::Arc;
use tracing::{debug, error};

use super::failure_message;
use super::prompt::follow_up_prompt;
use crate::llm::{Provider, ProviderRegistry};

const BULLET_MARKERS: [char; 3] = ['•', '-', '*'];

/// Asks the primary provider for related questions about an answer
pub struct FollowUpSuggester {
    registry: Arc<ProviderRegistry>,
}

impl FollowUpSuggester {
    #[inline]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Suggested follow-up questions, in the order the model listed them.
    ///
    /// A provider failure is returned as a single line holding the error text, so the
    /// caller can always show whatever comes back.
    #[inline]
    pub fn suggest(&self, answer: &str) -> Vec<String> {
        match self.registry.primary().generate(&follow_up_prompt(answer)) {
            Ok(raw) => {
                let suggestions = parse_follow_ups(&raw);
                debug!("Parsed {} follow-up suggestions", suggestions.len());
                suggestions
            }
            Err(e) => {
                error!("Follow-up suggestion failed: {}", e);
                vec![failure_message(Provider::Gemini, &e)]
            }
        }
    }
}

/// One suggestion per non-empty line, with leading bullet markers and `**` emphasis removed
#[inline]
pub fn parse_follow_ups(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(BULLET_MARKERS)
                .trim()
                .trim_matches('*')
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}
