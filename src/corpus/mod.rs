
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// One retrievable passage. `id` is the chunk's position in the corpus and therefore
/// also the row of its embedding in the vector index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub id: usize,
    pub content: String,
    /// Source identifier or title carried by the corpus file, if any
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawChunk {
    content: String,
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
}

/// The ordered, read-only set of article chunks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    chunks: Vec<Chunk>,
}

pub type Fingerprint = [u8; 16];

impl Corpus {
    /// Load a corpus from a JSON array of `{ "content": ... }` objects
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading corpus from {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;

        let corpus = Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse corpus file: {}", path.display()))?;

        info!("Loaded {} chunks from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    #[inline]
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: Vec<RawChunk> =
            serde_json::from_str(json).context("Corpus must be a JSON array of objects with a `content` field")?;

        let chunks = raw
            .into_iter()
            .enumerate()
            .map(|(id, raw)| Chunk {
                id,
                content: raw.content,
                label: raw.title.or_else(|| raw.id.map(|value| label_from_json(&value))),
            })
            .collect();

        Ok(Self { chunks })
    }

    #[inline]
    pub fn from_contents<I, S>(contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks = contents
            .into_iter()
            .enumerate()
            .map(|(id, content)| Chunk {
                id,
                content: content.into(),
                label: None,
            })
            .collect();

        Self { chunks }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Chunk texts in corpus order, ready for a batch embedding call
    #[inline]
    pub fn contents(&self) -> Vec<String> {
        self.chunks.iter().map(|c| c.content.clone()).collect()
    }

    /// MD5 digest over every chunk's content in order.
    ///
    /// Stored in the index header so a corpus edited or reordered after the build is
    /// detected when the index is loaded.
    #[inline]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut context = md5::Context::new();
        for chunk in &self.chunks {
            context.consume((chunk.content.len() as u64).to_le_bytes());
            context.consume(chunk.content.as_bytes());
        }
        context.compute().0
    }
}

fn label_from_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
