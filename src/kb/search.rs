//! Knowledge-base search stage: preprocess, vectorize, query the index

use std::path::PathBuf;
use std::sync::RwLock;

use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::errors::Result;
use crate::kb::MathTextPreprocessor;
use crate::kb::SimilarityIndex;
use crate::kb::TfidfVectorizer;
use crate::models::ProblemRecord;
use crate::models::SearchResult;

/// Seam for the routing state machine: anything that can rank pre-solved
/// problems against a question.
pub trait KnowledgeSearch: Send + Sync {
    /// Rank knowledge-base entries against a raw text question.
    fn search(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>>;
}

/// The knowledge base: preprocessor + vectorizer + similarity index.
pub struct KnowledgeBase {
    preprocessor: MathTextPreprocessor,
    vectorizer: RwLock<TfidfVectorizer>,
    index: SimilarityIndex,
    vectorizer_path: Option<PathBuf>,
}

impl KnowledgeBase {
    #[must_use]
    pub fn new(max_features: usize, vectorizer_path: Option<PathBuf>) -> Self {
        Self {
            preprocessor: MathTextPreprocessor::new(),
            vectorizer: RwLock::new(TfidfVectorizer::new(max_features)),
            index: SimilarityIndex::new(),
            vectorizer_path,
        }
    }

    /// Build the searchable set from problem records.
    ///
    /// Fits the vectorizer on the preprocessed questions, replaces the
    /// index, and persists the fitted vectorizer for later runs.
    pub fn ingest(&self, records: Vec<ProblemRecord>) -> Result<usize> {
        if records.is_empty() {
            warn!("Knowledge-base ingestion called with no records");
            return Ok(0);
        }

        let documents: Vec<String> = records
            .iter()
            .map(|record| self.searchable_text(&record.question))
            .collect();

        let mut vectorizer = self.vectorizer.write().expect("vectorizer lock poisoned");
        vectorizer.fit(&documents);

        let indexed = records
            .into_iter()
            .zip(&documents)
            .map(|(record, document)| {
                let vector = vectorizer.transform(document);
                (std::sync::Arc::new(record), vector)
            })
            .collect::<Vec<_>>();

        let count = indexed.len();
        self.index.index(indexed);

        if let Some(path) = &self.vectorizer_path {
            if let Err(e) = vectorizer.save(path) {
                // Persistence failure degrades later restarts, not this run
                warn!("Failed to persist vectorizer to {}: {}", path.display(), e);
            }
        }

        info!("Knowledge base ready with {} problems", count);
        Ok(count)
    }

    /// Number of indexed problems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Recover a fitted vectorizer from disk when the in-process one has not
    /// been fitted. Missing persisted state is a degraded condition, not
    /// fatal: searches continue with zero scores.
    fn ensure_vectorizer(&self) {
        if self.vectorizer.read().expect("vectorizer lock poisoned").is_fitted() {
            return;
        }

        if let Some(path) = &self.vectorizer_path {
            match TfidfVectorizer::load(path) {
                Ok(loaded) => {
                    info!("Loaded persisted vectorizer from {}", path.display());
                    *self.vectorizer.write().expect("vectorizer lock poisoned") = loaded;
                    return;
                }
                Err(e) => {
                    warn!(
                        "Vectorization degraded: no fitted vectorizer ({}); continuing with reduced quality",
                        e
                    );
                }
            }
        } else {
            warn!("Vectorization degraded: vectorizer not fitted and no persistence path");
        }
    }

    fn searchable_text(&self, question: &str) -> String {
        // Enhanced terms plus the original text, so exact phrasings still match
        format!("{} {}", self.preprocessor.preprocess(question), question)
    }
}

impl KnowledgeSearch for KnowledgeBase {
    fn search(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        debug!("KB search: {}", question);
        self.ensure_vectorizer();

        let combined = self.searchable_text(question);
        let vector = self
            .vectorizer
            .read()
            .expect("vectorizer lock poisoned")
            .transform(&combined);

        self.index.query(&vector, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<ProblemRecord> {
        vec![
            ProblemRecord {
                id: "p1".to_string(),
                question: "Solve the quadratic equation x^2 + 5x + 6 = 0".to_string(),
                topic: "algebra".to_string(),
                difficulty: "easy".to_string(),
                steps: vec![],
                full_solution: "Factor into (x+2)(x+3) = 0".to_string(),
                final_answer: "x = -2 or x = -3".to_string(),
                keywords: vec!["quadratic".to_string()],
            },
            ProblemRecord {
                id: "p2".to_string(),
                question: "Find the area of a circle with radius 5".to_string(),
                topic: "geometry".to_string(),
                difficulty: "easy".to_string(),
                steps: vec![],
                full_solution: "Area = pi r^2 = 25 pi".to_string(),
                final_answer: "25 pi".to_string(),
                keywords: vec!["circle".to_string()],
            },
        ]
    }

    #[test]
    fn test_search_ranks_matching_record_first() {
        let kb = KnowledgeBase::new(384, None);
        kb.ingest(sample_records()).unwrap();

        let results = kb
            .search("solve the quadratic equation x^2 + 5x + 6 = 0", 2)
            .unwrap();
        assert_eq!(results[0].result_id, "p1");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_search_is_idempotent() {
        let kb = KnowledgeBase::new(384, None);
        kb.ingest(sample_records()).unwrap();

        let first = kb.search("area of a circle", 2).unwrap();
        let second = kb.search("area of a circle", 2).unwrap();

        let first_scored: Vec<(String, f32)> = first
            .iter()
            .map(|r| (r.result_id.clone(), r.score))
            .collect();
        let second_scored: Vec<(String, f32)> = second
            .iter()
            .map(|r| (r.result_id.clone(), r.score))
            .collect();
        assert_eq!(first_scored, second_scored);
    }

    #[test]
    fn test_search_before_ingest_is_index_not_ready() {
        let kb = KnowledgeBase::new(384, None);
        let result = kb.search("anything", 3);
        assert!(matches!(
            result,
            Err(crate::errors::MathRagError::IndexNotReady(_))
        ));
    }
}
