// In-memory vector index
// Brute-force cosine search over records held for the life of the process


use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{SearchHit, VectorIndex, VectorRecord, cosine_similarity};
use crate::{RagError, Result};

/// Vector index backed by a vector of records behind a single lock.
///
/// Records keep their first insertion position, which decides the order of equal scores.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    state: RwLock<IndexState>,
}

#[derive(Debug, Default)]
struct IndexState {
    records: Vec<VectorRecord>,
    positions: HashMap<String, usize>,
    dimension: Option<usize>,
    fixed_dimension: bool,
}

impl IndexState {
    fn check_dimension(&self, actual: usize) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(RagError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

impl InMemoryIndex {
    /// Create an index whose dimension is taken from the first inserted record
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index that only accepts vectors of length `dimension`
    #[inline]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            state: RwLock::new(IndexState {
                dimension: Some(dimension),
                fixed_dimension: true,
                ..IndexState::default()
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl VectorIndex for InMemoryIndex {
    fn insert(&self, record: VectorRecord) -> Result<()> {
        let mut state = self.write();
        state.check_dimension(record.vector.len())?;

        if state.dimension.is_none() {
            debug!("Index dimension set to {}", record.vector.len());
            state.dimension = Some(record.vector.len());
        }

        if let Some(&position) = state.positions.get(&record.id) {
            debug!("Overwriting record {}", record.id);
            if let Some(slot) = state.records.get_mut(position) {
                *slot = record;
            }
        } else {
            let position = state.records.len();
            state.positions.insert(record.id.clone(), position);
            state.records.push(record);
        }

        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let state = self.read();
        if state.records.is_empty() {
            return Ok(Vec::new());
        }
        state.check_dimension(query.len())?;

        let mut scored: Vec<(f32, &VectorRecord)> = state
            .records
            .iter()
            .map(|record| (cosine_similarity(query, &record.vector), record))
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        let hits: Vec<SearchHit> = scored
            .into_iter()
            .take(top_k)
            .map(|(score, record)| SearchHit {
                payload: record.payload.clone(),
                score,
            })
            .collect();

        debug!(
            "Searched {} records, returning {} hits",
            state.records.len(),
            hits.len()
        );
        Ok(hits)
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.write();
        debug!("Clearing {} records", state.records.len());

        state.records.clear();
        state.positions.clear();
        if !state.fixed_dimension {
            state.dimension = None;
        }

        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn len(&self) -> usize {
        self.read().records.len()
    }

    fn dimension(&self) -> Option<usize> {
        self.read().dimension
    }
}
