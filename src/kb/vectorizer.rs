//! TF-IDF vectorization for knowledge-base text
//!
//! A small, dependency-free TF-IDF implementation: fit builds a bounded
//! vocabulary with smoothed inverse document frequencies, transform produces
//! l2-normalized vectors so that cosine similarity reduces to a dot product.
//! The fitted state persists as JSON so searches after a restart use the
//! same vocabulary the index was built with.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;

/// Common English stop words excluded from the vocabulary.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "below", "between", "both", "but", "by", "can", "did",
    "do", "does", "doing", "down", "during", "each", "few", "for", "from", "further", "had",
    "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in",
    "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not", "now",
    "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "you", "your",
];

/// TF-IDF vectorizer with a bounded vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    max_features: usize,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    #[must_use]
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
        }
    }

    /// Whether `fit` has been called (or a fitted state loaded).
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Vocabulary size of the fitted vectorizer.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Fit the vocabulary and inverse document frequencies on a corpus.
    ///
    /// Terms are ranked by total corpus frequency and capped at
    /// `max_features`; ties and vocabulary indices are resolved
    /// alphabetically so fitting is deterministic.
    pub fn fit(&mut self, documents: &[String]) {
        let mut total_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_counts: HashMap<String, usize> = HashMap::new();

        for document in documents {
            let tokens = tokenize(document);
            let mut seen: HashSet<&str> = HashSet::new();
            for token in &tokens {
                *total_counts.entry(token.clone()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *doc_counts.entry(token.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut ranked: Vec<(String, usize)> = total_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_features);

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let n_docs = documents.len() as f32;
        self.vocabulary.clear();
        self.idf = vec![0.0; terms.len()];
        for (index, term) in terms.into_iter().enumerate() {
            let df = doc_counts.get(&term).copied().unwrap_or(0) as f32;
            // Smoothed idf, as if one extra document contained every term
            self.idf[index] = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
            self.vocabulary.insert(term, index);
        }

        debug!(
            "Fitted TF-IDF vectorizer: {} terms from {} documents",
            self.vocabulary.len(),
            documents.len()
        );
    }

    /// Transform text into an l2-normalized TF-IDF vector.
    ///
    /// Returns a zero vector when no vocabulary term occurs in the text, and
    /// an empty vector when the vectorizer has not been fitted.
    #[must_use]
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.idf.len()];
        if self.vocabulary.is_empty() {
            return vector;
        }

        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                vector[index] += 1.0;
            }
        }

        for (value, idf) in vector.iter_mut().zip(&self.idf) {
            *value *= idf;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }

    /// Persist the fitted state as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load a previously persisted fitted state.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let vectorizer = serde_json::from_str(&content)?;
        Ok(vectorizer)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 1 && !STOP_WORDS.contains(token))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        vec![
            "solve the quadratic equation".to_string(),
            "find the derivative of the function".to_string(),
            "area of a circle with radius five".to_string(),
        ]
    }

    #[test]
    fn test_transform_is_deterministic() {
        let mut vectorizer = TfidfVectorizer::new(384);
        vectorizer.fit(&corpus());

        let a = vectorizer.transform("solve quadratic equation");
        let b = vectorizer.transform("solve quadratic equation");
        assert_eq!(a, b);
    }

    #[test]
    fn test_transform_is_normalized() {
        let mut vectorizer = TfidfVectorizer::new(384);
        vectorizer.fit(&corpus());

        let vector = vectorizer.transform("derivative of the function");
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unfitted_transform_is_empty() {
        let vectorizer = TfidfVectorizer::new(384);
        assert!(!vectorizer.is_fitted());
        assert!(vectorizer.transform("anything").is_empty());
    }

    #[test]
    fn test_max_features_bounds_vocabulary() {
        let mut vectorizer = TfidfVectorizer::new(2);
        vectorizer.fit(&corpus());
        assert_eq!(vectorizer.dimension(), 2);
    }

    #[test]
    fn test_save_and_load_preserves_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectorizer.json");

        let mut vectorizer = TfidfVectorizer::new(384);
        vectorizer.fit(&corpus());
        vectorizer.save(&path).unwrap();

        let loaded = TfidfVectorizer::load(&path).unwrap();
        assert!(loaded.is_fitted());
        assert_eq!(
            loaded.transform("quadratic equation"),
            vectorizer.transform("quadratic equation")
        );
    }
}
