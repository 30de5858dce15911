// Session module
// The per-query pipeline: retrieve, answer, record, suggest

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::answer::{Answer, AnswerGenerator, FollowUpSuggester};
use crate::config::{Config, Credentials};
use crate::conversation::ConversationHistory;
use crate::embeddings::{Embedder, OllamaClient, verify_embedder};
use crate::llm::{Provider, ProviderRegistry};
use crate::retrieval::{KnowledgeBase, KnowledgeBaseCache};

/// Shown instead of an answer when retrieval comes back empty
pub const NO_RESULTS_MESSAGE: &str = "❌ No relevant information found.";

/// One user's conversation. Created empty, discarded with its owner.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    history: ConversationHistory,
}

/// A chunk that was used as context for an answer
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: usize,
    pub label: Option<String>,
    pub distance: f32,
}

/// Outcome of one question
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    /// The query was blank; nothing was done
    EmptyQuery,
    /// Retrieval found nothing, so no provider was called
    NoResults,
    Answered {
        answer: Answer,
        sources: Vec<Source>,
        follow_ups: Vec<String>,
    },
}

/// Shared query-time services: the knowledge base handle and the providers
pub struct Agent {
    knowledge: KnowledgeBaseCache,
    answers: AnswerGenerator,
    suggester: FollowUpSuggester,
    top_k: usize,
    record_failed_turns: bool,
}

impl Session {
    #[inline]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            history: ConversationHistory::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}

impl Default for Session {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange {
    /// Text to show the user for this exchange
    #[inline]
    pub fn message(&self) -> &str {
        match self {
            Exchange::EmptyQuery => "",
            Exchange::NoResults => NO_RESULTS_MESSAGE,
            Exchange::Answered { answer, .. } => &answer.text,
        }
    }
}

impl Agent {
    #[inline]
    pub fn new(knowledge: KnowledgeBaseCache, registry: Arc<ProviderRegistry>, config: &Config) -> Self {
        Self {
            knowledge,
            answers: AnswerGenerator::new(Arc::clone(&registry))
                .with_history_window(config.conversation.history_window),
            suggester: FollowUpSuggester::new(registry),
            top_k: config.retrieval.top_k,
            record_failed_turns: config.conversation.record_failed_turns,
        }
    }

    /// Wire up Ollama embeddings, the on-disk knowledge base and the hosted providers.
    ///
    /// Fails with [`crate::AgentError::Embedding`] when Ollama cannot embed a test text at the
    /// configured dimension.
    #[inline]
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        let client =
            OllamaClient::new(&config.embedding).context("Failed to configure embedding client")?;
        verify_embedder(&client.clone().with_retry_attempts(1))?;
        let embedder: Arc<dyn Embedder> = Arc::new(client);
        let registry = Arc::new(
            ProviderRegistry::from_config(&config.providers, credentials)
                .context("Failed to configure text-generation providers")?,
        );

        Ok(Self::new(
            knowledge_base_cache(config, embedder, config.cache_ttl()),
            registry,
            config,
        ))
    }

    #[inline]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn is_available(&self, provider: Provider) -> bool {
        self.answers.registry().is_available(provider)
    }

    /// Load the knowledge base now instead of on the first question
    #[inline]
    pub fn warm_up(&mut self) -> Result<Arc<KnowledgeBase>> {
        self.knowledge.get()
    }

    /// Answer `query` within `session`.
    ///
    /// Provider failures do not error: they come back as an [`Exchange::Answered`] whose
    /// answer is marked failed. Errors are reserved for the knowledge base being
    /// unavailable or the query failing to embed.
    #[inline]
    pub fn ask(&mut self, session: &mut Session, query: &str, provider: Provider) -> Result<Exchange> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Exchange::EmptyQuery);
        }

        let knowledge = self.knowledge.get().context("Knowledge base unavailable")?;
        let hits = knowledge.retriever().retrieve(query, self.top_k)?;
        if hits.is_empty() {
            info!("No chunks retrieved for query in session {}", session.id);
            return Ok(Exchange::NoResults);
        }

        let chunks: Vec<&str> = hits.iter().map(|hit| hit.chunk.content.as_str()).collect();
        let sources = hits
            .iter()
            .map(|hit| Source {
                id: hit.chunk.id,
                label: hit.chunk.label.clone(),
                distance: hit.distance,
            })
            .collect();

        let answer = self
            .answers
            .generate(&chunks, query, &session.history, provider);

        if !answer.failed || self.record_failed_turns {
            session.history.append(query, answer.text.as_str());
        } else {
            debug!("Not recording failed turn in session {}", session.id);
        }

        let follow_ups = if answer.failed {
            Vec::new()
        } else {
            self.suggester.suggest(&answer.text)
        };

        Ok(Exchange::Answered {
            answer,
            sources,
            follow_ups,
        })
    }
}

/// Cache that reloads the corpus and index named by `config` every `ttl`
#[inline]
pub fn knowledge_base_cache(
    config: &Config,
    embedder: Arc<dyn Embedder>,
    ttl: Duration,
) -> KnowledgeBaseCache {
    let config = config.clone();
    KnowledgeBaseCache::new(ttl, move || {
        KnowledgeBase::load(&config, Arc::clone(&embedder))
    })
}
