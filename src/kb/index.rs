//! In-memory cosine similarity index over knowledge-base records

use std::sync::Arc;
use std::sync::RwLock;

use tracing::debug;

use crate::errors::MathRagError;
use crate::errors::Result;
use crate::models::ProblemRecord;
use crate::models::ResultSource;
use crate::models::SearchPayload;
use crate::models::SearchResult;

struct IndexedRecord {
    record: Arc<ProblemRecord>,
    vector: Vec<f32>,
}

/// Similarity index with full-rebuild semantics.
///
/// Records are shared read-only; rebuilds take the write lock so they never
/// run concurrently with queries.
pub struct SimilarityIndex {
    entries: RwLock<Vec<IndexedRecord>>,
}

impl SimilarityIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Build (or replace) the searchable set.
    ///
    /// Vectors are expected to be l2-normalized by the caller.
    pub fn index(&self, records: Vec<(Arc<ProblemRecord>, Vec<f32>)>) {
        let indexed: Vec<IndexedRecord> = records
            .into_iter()
            .map(|(record, vector)| IndexedRecord { record, vector })
            .collect();

        let count = indexed.len();
        let mut entries = self.entries.write().expect("index lock poisoned");
        *entries = indexed;
        debug!("Similarity index rebuilt with {} records", count);
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("index lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Query the index, returning up to `top_k` results ordered by
    /// descending cosine score. Ties resolve to the earlier-indexed record
    /// so identical inputs always produce identical output.
    pub fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let entries = self.entries.read().expect("index lock poisoned");
        if entries.is_empty() {
            return Err(MathRagError::IndexNotReady(
                "similarity index queried before any records were indexed".to_string(),
            ));
        }

        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, cosine_score(vector, &entry.vector)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(position, score)| {
                let entry = &entries[position];
                SearchResult {
                    score,
                    payload: SearchPayload::Record(entry.record.clone()),
                    source: ResultSource::KnowledgeBase,
                    result_id: entry.record.id.clone(),
                }
            })
            .collect())
    }
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Cosine similarity clamped to [0, 1].
///
/// Both vectors are l2-normalized, so the dot product already is the cosine;
/// mismatched dimensions or a zero query yield 0.0 rather than an error.
fn cosine_score(query: &[f32], candidate: &[f32]) -> f32 {
    if query.len() != candidate.len() || query.is_empty() {
        return 0.0;
    }
    let dot: f32 = query.iter().zip(candidate).map(|(a, b)| a * b).sum();
    dot.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> Arc<ProblemRecord> {
        Arc::new(ProblemRecord {
            id: id.to_string(),
            question: format!("question {id}"),
            topic: "algebra".to_string(),
            difficulty: "easy".to_string(),
            steps: vec![],
            full_solution: String::new(),
            final_answer: "42".to_string(),
            keywords: vec![],
        })
    }

    #[test]
    fn test_query_before_index_fails() {
        let index = SimilarityIndex::new();
        let result = index.query(&[1.0, 0.0], 3);
        assert!(matches!(result, Err(MathRagError::IndexNotReady(_))));
    }

    #[test]
    fn test_query_orders_by_descending_score() {
        let index = SimilarityIndex::new();
        index.index(vec![
            (record("far"), vec![0.0, 1.0]),
            (record("near"), vec![1.0, 0.0]),
        ]);

        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].result_id, "near");
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_tie_break_prefers_insertion_order() {
        let index = SimilarityIndex::new();
        index.index(vec![
            (record("first"), vec![1.0, 0.0]),
            (record("second"), vec![1.0, 0.0]),
        ]);

        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].result_id, "first");
        assert_eq!(results[1].result_id, "second");
    }

    #[test]
    fn test_top_k_truncates() {
        let index = SimilarityIndex::new();
        index.index(vec![
            (record("a"), vec![1.0, 0.0]),
            (record("b"), vec![0.8, 0.6]),
            (record("c"), vec![0.0, 1.0]),
        ]);

        let results = index.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_dimension_mismatch_scores_zero() {
        let index = SimilarityIndex::new();
        index.index(vec![(record("a"), vec![1.0, 0.0])]);

        let results = index.query(&[], 1).unwrap();
        assert!((results[0].score - 0.0).abs() < f32::EPSILON);
    }
}
