//! Knowledge-base module
//!
//! Everything between a raw text question and ranked pre-solved problems:
//! - Mathematical text preprocessing (LaTeX stripping, synonym expansion)
//! - TF-IDF vectorization with persisted fitted state
//! - In-memory cosine similarity index with full-rebuild semantics
//! - The search stage tying the three together behind `KnowledgeSearch`

pub mod index;
pub mod loader;
pub mod preprocess;
pub mod search;
pub mod vectorizer;

pub use index::SimilarityIndex;
pub use loader::load_problems;
pub use preprocess::MathTextPreprocessor;
pub use search::KnowledgeBase;
pub use search::KnowledgeSearch;
pub use vectorizer::TfidfVectorizer;
