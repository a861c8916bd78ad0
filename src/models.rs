//! Core data model: knowledge-base records, search results and solutions

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

/// A pre-solved problem stored in the knowledge base.
///
/// Records are created once at ingestion time and never mutated; the
/// similarity index owns them and shares them read-only across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub id: String,
    pub question: String,
    /// Normalized lowercase topic tag, e.g. "algebra"
    pub topic: String,
    pub difficulty: String,
    #[serde(default)]
    pub steps: Vec<RecordStep>,
    /// Prose solution text used as a reference when generating steps
    #[serde(default)]
    pub full_solution: String,
    pub final_answer: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// One stored step of a knowledge-base record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordStep {
    pub index: usize,
    pub text: String,
}

/// A single result snippet returned by a web search provider.
///
/// Every provider adapter normalizes into this shape at its own boundary,
/// so nothing downstream inspects provider-specific payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSnippet {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub source: String,
}

/// Where a search result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    KnowledgeBase,
    Provider(String),
}

/// Payload of a search result: either a matched record or a web snippet.
#[derive(Debug, Clone)]
pub enum SearchPayload {
    Record(Arc<ProblemRecord>),
    Snippet(WebSnippet),
}

/// Search result with relevance score.
///
/// Scores are normalized to [0, 1] and comparable across providers within
/// one query, but not across different queries.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub score: f32,
    pub payload: SearchPayload,
    pub source: ResultSource,
    pub result_id: String,
}

impl SearchResult {
    /// The matched record, if this result came from the knowledge base.
    #[must_use]
    pub fn record(&self) -> Option<&Arc<ProblemRecord>> {
        match &self.payload {
            SearchPayload::Record(record) => Some(record),
            SearchPayload::Snippet(_) => None,
        }
    }

    /// The web snippet, if this result came from a provider.
    #[must_use]
    pub fn snippet(&self) -> Option<&WebSnippet> {
        match &self.payload {
            SearchPayload::Snippet(snippet) => Some(snippet),
            SearchPayload::Record(_) => None,
        }
    }
}

/// Which evidence source produced a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    KnowledgeBase,
    WebSearch,
    KnowledgeBaseError,
    WebSearchError,
    Error,
    ErrorRecursion,
}

impl Route {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KnowledgeBase => "knowledge_base",
            Self::WebSearch => "web_search",
            Self::KnowledgeBaseError => "knowledge_base_error",
            Self::WebSearchError => "web_search_error",
            Self::Error => "error",
            Self::ErrorRecursion => "error_recursion",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a solution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    SolutionStep,
    Metadata,
}

/// One ordered step of a solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionStep {
    pub step_number: usize,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: StepKind,
}

impl SolutionStep {
    #[must_use]
    pub fn new(step_number: usize, text: impl Into<String>) -> Self {
        Self {
            step_number,
            text: text.into(),
            kind: StepKind::SolutionStep,
        }
    }
}

/// Citation attached to a solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub source: String,
}

/// The pipeline's output unit, constructed fresh per request and immutable
/// once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub route: Route,
    pub question: String,
    pub steps: Vec<SolutionStep>,
    pub final_answer: String,
    /// Estimated correctness/relevance in [0, 1]; source-dependent, not
    /// globally calibrated.
    pub confidence: f32,
    pub method: String,
    pub sources: Vec<Citation>,
    pub processing_time_ms: u64,
}
