// Retrieval module
// Query-time nearest-passage lookup over the persisted index

mod cache;


use anyhow::{Context, Result, bail};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::corpus::{Chunk, Corpus};
use crate::embeddings::Embedder;
use crate::index::{FlatL2Index, Neighbor};

pub use cache::KnowledgeBaseCache;

/// The read-only state shared by every query: corpus, index and the embedder that built it
pub struct KnowledgeBase {
    corpus: Corpus,
    index: FlatL2Index,
    embedder: Arc<dyn Embedder>,
}

/// A corpus chunk returned for a query, with its distance to the query vector
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk<'a> {
    pub chunk: &'a Chunk,
    pub distance: f32,
}

/// Embeds a query and maps its nearest index rows back to corpus chunks
#[derive(Clone, Copy)]
pub struct Retriever<'a> {
    embedder: &'a dyn Embedder,
    index: &'a FlatL2Index,
    corpus: &'a Corpus,
}

impl KnowledgeBase {
    /// Assemble a knowledge base, checking that the index matches the corpus row for row
    /// and that the embedder produces vectors of the index's dimension
    #[inline]
    pub fn new(corpus: Corpus, index: FlatL2Index, embedder: Arc<dyn Embedder>) -> Result<Self> {
        index
            .verify_corpus(&corpus)
            .context("Index does not match corpus")?;

        if embedder.dimension() != index.dimension() {
            bail!(
                "Embedder produces {}-dimensional vectors but the index holds {}-dimensional rows",
                embedder.dimension(),
                index.dimension()
            );
        }

        Ok(Self {
            corpus,
            index,
            embedder,
        })
    }

    /// Load the corpus and index files named by `config`
    #[inline]
    pub fn load(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let corpus_path = config.corpus_path();
        let index_path = config.index_path();

        let corpus = Corpus::load(&corpus_path)?;
        let index = FlatL2Index::load(&index_path)
            .with_context(|| format!("Failed to load index file: {}", index_path.display()))?;

        let knowledge_base = Self::new(corpus, index, embedder)?;
        info!(
            "Knowledge base ready: {} chunks from {}",
            knowledge_base.corpus.len(),
            corpus_path.display()
        );
        Ok(knowledge_base)
    }

    #[inline]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[inline]
    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    #[inline]
    pub fn retriever(&self) -> Retriever<'_> {
        Retriever {
            embedder: self.embedder.as_ref(),
            index: &self.index,
            corpus: &self.corpus,
        }
    }
}

impl<'a> Retriever<'a> {
    #[inline]
    pub fn new(embedder: &'a dyn Embedder, index: &'a FlatL2Index, corpus: &'a Corpus) -> Self {
        Self {
            embedder,
            index,
            corpus,
        }
    }

    /// Identifiers of the (at most) `k` chunks nearest to `query`, nearest first
    #[inline]
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<usize>> {
        Ok(self
            .nearest(query, k)?
            .into_iter()
            .map(|hit| hit.id)
            .collect())
    }

    /// Nearest chunks for `query`, skipping any row id the corpus does not have
    #[inline]
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk<'a>>> {
        let corpus = self.corpus;
        let chunks: Vec<RetrievedChunk<'a>> = self
            .nearest(query, k)?
            .into_iter()
            .filter_map(|hit| {
                corpus.get(hit.id).map(|chunk| RetrievedChunk {
                    chunk,
                    distance: hit.distance,
                })
            })
            .collect();

        debug!("Retrieved {} chunks for query", chunks.len());
        Ok(chunks)
    }

    fn nearest(&self, query: &str, k: usize) -> Result<Vec<Neighbor>> {
        let query_vector = self
            .embedder
            .embed_one(query)
            .context("Failed to embed query")?;

        self.index
            .search(&query_vector, k)
            .context("Vector search failed")
    }
}
