// Vector index module
// Exact (brute-force) L2 nearest-neighbour index with a self-describing file format

mod file;


use std::cmp::Ordering;
use thiserror::Error;
use tracing::debug;

use crate::corpus::{Corpus, Fingerprint};

pub use file::{FORMAT_VERSION, MAGIC};

/// A search hit: the row id of an indexed vector and its squared L2 distance to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    pub distance: f32,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index dimension must be greater than zero")]
    ZeroDimension,
    #[error("Vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Not an index file (bad magic bytes)")]
    BadMagic,
    #[error("Unsupported index format version {0}")]
    UnsupportedVersion(u32),
    #[error("Index file is truncated or corrupted: {0}")]
    Corrupted(String),
    #[error("Index has {indexed} rows but the corpus has {corpus} chunks; rebuild the index")]
    RowCountMismatch { indexed: usize, corpus: usize },
    #[error("Corpus content changed since the index was built; rebuild the index")]
    FingerprintMismatch,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat index over equal-length `f32` vectors, stored row-major.
///
/// Rows are append-only: row `i` is the `i`-th vector added. Searching never mutates
/// the index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    vectors: Vec<f32>,
    fingerprint: Fingerprint,
}

impl FlatL2Index {
    #[inline]
    pub fn new(dimension: usize) -> Result<Self, IndexError> {
        if dimension == 0 {
            return Err(IndexError::ZeroDimension);
        }

        Ok(Self {
            dimension,
            vectors: Vec::new(),
            fingerprint: [0; 16],
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of indexed rows
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Fingerprint of the corpus the rows were computed from
    #[inline]
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    #[inline]
    pub fn set_fingerprint(&mut self, fingerprint: Fingerprint) {
        self.fingerprint = fingerprint;
    }

    /// Append one vector, returning its row id
    #[inline]
    pub fn add(&mut self, vector: &[f32]) -> Result<usize, IndexError> {
        self.check_dimension(vector)?;
        let id = self.len();
        self.vectors.extend_from_slice(vector);
        Ok(id)
    }

    /// Append vectors in order. Nothing is added if any vector has the wrong dimension.
    #[inline]
    pub fn add_batch(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for vector in vectors {
            self.check_dimension(vector)?;
        }

        self.vectors.reserve(vectors.len() * self.dimension);
        for vector in vectors {
            self.vectors.extend_from_slice(vector);
        }
        Ok(())
    }

    /// Stored vector for row `id`
    #[inline]
    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        let start = id.checked_mul(self.dimension)?;
        self.vectors.get(start..start.checked_add(self.dimension)?)
    }

    /// The `k` rows nearest to `query`, ordered by non-decreasing distance.
    ///
    /// Returns `min(k, len)` hits. Equal distances are ordered by row id.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        self.check_dimension(query)?;

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, row)| Neighbor {
                id,
                distance: squared_l2(query, row),
            })
            .collect();

        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, compare_neighbors);
            hits.truncate(k);
        }
        hits.sort_unstable_by(compare_neighbors);

        debug!("Flat search over {} rows returned {} hits", self.len(), hits.len());
        Ok(hits)
    }

    /// Check that this index was built from `corpus`, row for row
    #[inline]
    pub fn verify_corpus(&self, corpus: &Corpus) -> Result<(), IndexError> {
        if self.len() != corpus.len() {
            return Err(IndexError::RowCountMismatch {
                indexed: self.len(),
                corpus: corpus.len(),
            });
        }

        if self.fingerprint != corpus.fingerprint() {
            return Err(IndexError::FingerprintMismatch);
        }

        Ok(())
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), IndexError> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }
}

/// Squared Euclidean distance, the metric reported by flat L2 indexes
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn compare_neighbors(a: &Neighbor, b: &Neighbor) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.id.cmp(&b.id))
}
