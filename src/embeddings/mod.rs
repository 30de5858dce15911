// Embeddings module
// Sentence-embedding provider seam and the Ollama-backed implementation

pub mod ollama;


use anyhow::{Result, anyhow};
use tracing::debug;

use crate::AgentError;

pub use ollama::{DEFAULT_EMBEDDING_DIMENSION, OllamaClient};

/// Converts text into fixed-dimensional vectors.
///
/// Every vector produced by one embedder has the same length, [`Embedder::dimension`].
/// The index builder and the retriever must share an embedder (or at least a model),
/// otherwise query vectors are not comparable with indexed rows.
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    /// Embed `texts`, returning one vector per input in the same order
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text as a one-element batch
    #[inline]
    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("Embedder returned no vector for a single input"))
    }
}

const STARTUP_CHECK_TEXT: &str = "personal data";

/// Embed one short text and confirm the vector has the advertised dimension.
///
/// Run before serving queries so an unreachable or misconfigured embedder is reported up
/// front instead of on the first question.
#[inline]
pub fn verify_embedder(embedder: &dyn Embedder) -> std::result::Result<(), AgentError> {
    let vector = embedder
        .embed_one(STARTUP_CHECK_TEXT)
        .map_err(|e| AgentError::Embedding(format!("embedder is not usable: {e:#}")))?;

    if vector.len() != embedder.dimension() {
        return Err(AgentError::Embedding(format!(
            "embedder returned {} dimensions, expected {}",
            vector.len(),
            embedder.dimension()
        )));
    }

    debug!("Embedder answered with {} dimensions", vector.len());
    Ok(())
}
