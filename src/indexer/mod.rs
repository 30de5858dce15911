// Indexer module
// Offline build of the vector index from the corpus

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::corpus::Corpus;
use crate::embeddings::Embedder;
use crate::index::FlatL2Index;


/// Builds a [`FlatL2Index`] whose row `i` is the embedding of corpus chunk `i`
pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    show_progress: bool,
}

/// Summary of a completed build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStats {
    pub chunks_indexed: usize,
    pub dimension: usize,
    pub duration: Duration,
}

impl<'a> IndexBuilder<'a> {
    #[inline]
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self {
            embedder,
            show_progress: false,
        }
    }

    /// Show a spinner on stderr while embeddings are computed
    #[inline]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Embed every chunk in one batch and index the vectors in corpus order
    #[inline]
    pub fn build(&self, corpus: &Corpus) -> Result<FlatL2Index> {
        if corpus.is_empty() {
            bail!("Cannot build an index from an empty corpus");
        }

        let bar = self.progress_bar(corpus.len());

        debug!("Embedding {} chunks", corpus.len());
        let embeddings = self
            .embedder
            .embed_batch(&corpus.contents())
            .context("Failed to embed corpus");
        bar.finish_and_clear();
        let embeddings = embeddings?;

        if embeddings.len() != corpus.len() {
            bail!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                corpus.len()
            );
        }

        let mut index = FlatL2Index::new(self.embedder.dimension())
            .context("Failed to create vector index")?;
        index
            .add_batch(&embeddings)
            .context("Embedding dimension does not match the embedder's declared dimension")?;
        index.set_fingerprint(corpus.fingerprint());

        Ok(index)
    }

    /// Build the index and write it to `path`, replacing any previous index
    #[inline]
    pub fn build_and_persist<P: AsRef<Path>>(&self, corpus: &Corpus, path: P) -> Result<BuildStats> {
        let path = path.as_ref();
        let started = Instant::now();

        let index = self.build(corpus)?;
        index
            .save(path)
            .with_context(|| format!("Failed to write index file: {}", path.display()))?;

        let stats = BuildStats {
            chunks_indexed: index.len(),
            dimension: index.dimension(),
            duration: started.elapsed(),
        };

        info!(
            "Indexed {} chunks ({} dimensions) in {:?}",
            stats.chunks_indexed, stats.dimension, stats.duration
        );
        Ok(stats)
    }

    fn progress_bar(&self, chunks: usize) -> ProgressBar {
        if !self.show_progress || !console::user_attended_stderr() {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} Embedding {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("{chunks} chunks"));
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}
