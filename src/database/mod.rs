// Vector index module
// Records, similarity scoring and the index abstraction used by retrieval


pub mod memory;

use serde::{Deserialize, Serialize};

pub use memory::InMemoryIndex;

use crate::Result;

/// Chunk data stored alongside its embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Document the chunk was cut from (the uploaded file name)
    pub document_id: String,
    /// 0-based position of the chunk within its document
    pub chunk_index: usize,
    pub text: String,
}

/// A stored embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

impl VectorRecord {
    /// Create a record whose id is derived from the payload's document and ordinal
    #[inline]
    pub fn new(vector: Vec<f32>, payload: ChunkPayload) -> Self {
        Self {
            id: chunk_id(&payload.document_id, payload.chunk_index),
            vector,
            payload,
        }
    }
}

/// Search result from vector similarity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub payload: ChunkPayload,
    /// Cosine similarity to the query, in `[-1, 1]`
    pub score: f32,
}

/// Record id for chunk `chunk_index` of `document_id`.
///
/// Re-ingesting a document yields the same ids, so its records are overwritten in place.
#[inline]
pub fn chunk_id(document_id: &str, chunk_index: usize) -> String {
    format!("{}_chunk_{}", document_id, chunk_index)
}

/// Storage and nearest-neighbour search over embeddings
pub trait VectorIndex: Send + Sync {
    /// Store `record`, replacing any record with the same id
    fn insert(&self, record: VectorRecord) -> Result<()>;

    /// The `top_k` records most similar to `query`, best first
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;

    /// Remove every record
    fn clear(&self) -> Result<()>;

    fn is_available(&self) -> bool;

    fn len(&self) -> usize;

    /// Length every stored vector must have, once it is known
    fn dimension(&self) -> Option<usize>;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine similarity of two vectors.
///
/// Sums are taken in `f64` so no finite `f32` component can overflow or underflow the
/// norms. Returns exactly `0.0` when the lengths differ, either vector has zero magnitude,
/// or the inputs contain non-finite values.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(dot, na, nb), (&x, &y)| {
            let (x, y) = (f64::from(x), f64::from(y));
            (x.mul_add(y, dot), x.mul_add(x, na), y.mul_add(y, nb))
        },
    );

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let ratio = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !ratio.is_finite() {
        return 0.0;
    }

    let score = ratio.clamp(-1.0, 1.0) as f32;
    // Collapse -0.0 so equal scores compare equal under a total order
    if score == 0.0 { 0.0 } else { score }
}
