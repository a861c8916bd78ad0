//! Web search provider adapters
//!
//! Each provider normalizes its own response format into [`WebSnippet`] at
//! the adapter boundary, so the aggregator and everything downstream work
//! with one explicit shape.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::errors::MathRagError;
use crate::errors::Result;
use crate::models::WebSnippet;

/// An independent external search source queried by the aggregator.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Stable provider name used in citations and ordering.
    fn name(&self) -> &'static str;

    /// Search for content related to the query.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebSnippet>>;
}

/// Build the HTTP client shared by the provider adapters.
pub fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .user_agent("Mozilla/5.0 (compatible; mathrag/0.1)")
        .build()
        .map_err(|e| MathRagError::Http(e.to_string()))
}

/// DuckDuckGo instant-answer API
pub struct DuckDuckGoProvider {
    client: Client,
}

impl DuckDuckGoProvider {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<WebSnippet>> {
        let response = self
            .client
            .get("https://api.duckduckgo.com/")
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_redirect", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| MathRagError::Provider(format!("duckduckgo: {e}")))?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| MathRagError::Provider(format!("duckduckgo: {e}")))?;

        let mut results = Vec::new();
        let abstract_text = data["Abstract"].as_str().unwrap_or_default();
        if !abstract_text.is_empty() {
            results.push(WebSnippet {
                title: data["Heading"]
                    .as_str()
                    .unwrap_or("DuckDuckGo Answer")
                    .to_string(),
                url: data["AbstractURL"]
                    .as_str()
                    .unwrap_or("https://duckduckgo.com")
                    .to_string(),
                snippet: abstract_text.to_string(),
                source: self.name().to_string(),
            });
        }

        Ok(results)
    }
}

/// Wikipedia REST summary + search API
pub struct WikipediaProvider {
    client: Client,
}

impl WikipediaProvider {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchProvider for WikipediaProvider {
    fn name(&self) -> &'static str {
        "wikipedia"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebSnippet>> {
        // Try the direct page summary first; fall through to full-text search
        let summary_url = format!(
            "https://en.wikipedia.org/api/rest_v1/page/summary/{}",
            query.replace(' ', "_")
        );
        if let Ok(response) = self.client.get(&summary_url).send().await {
            if response.status().is_success() {
                if let Ok(data) = response.json::<Value>().await {
                    let extract = data["extract"].as_str().unwrap_or_default();
                    if !extract.is_empty() {
                        return Ok(vec![WebSnippet {
                            title: data["title"].as_str().unwrap_or_default().to_string(),
                            url: data["content_urls"]["desktop"]["page"]
                                .as_str()
                                .unwrap_or_default()
                                .to_string(),
                            snippet: extract.to_string(),
                            source: self.name().to_string(),
                        }]);
                    }
                }
            }
        }

        let limit = max_results.to_string();
        let response = self
            .client
            .get("https://en.wikipedia.org/w/api.php")
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MathRagError::Provider(format!("wikipedia: {e}")))?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| MathRagError::Provider(format!("wikipedia: {e}")))?;

        let mut results = Vec::new();
        if let Some(items) = data["query"]["search"].as_array() {
            for item in items {
                let title = item["title"].as_str().unwrap_or_default();
                results.push(WebSnippet {
                    title: title.to_string(),
                    url: format!(
                        "https://en.wikipedia.org/wiki/{}",
                        title.replace(' ', "_")
                    ),
                    snippet: strip_html_tags(item["snippet"].as_str().unwrap_or_default()),
                    source: self.name().to_string(),
                });
            }
        }

        Ok(results)
    }
}

/// Mathematics Stack Exchange search API
pub struct MathStackExchangeProvider {
    client: Client,
}

impl MathStackExchangeProvider {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SearchProvider for MathStackExchangeProvider {
    fn name(&self) -> &'static str {
        "math_stackexchange"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebSnippet>> {
        let pagesize = max_results.to_string();
        let response = self
            .client
            .get("https://api.stackexchange.com/2.3/search/advanced")
            .query(&[
                ("order", "desc"),
                ("sort", "relevance"),
                ("q", query),
                ("site", "math"),
                ("pagesize", pagesize.as_str()),
                ("filter", "default"),
            ])
            .send()
            .await
            .map_err(|e| MathRagError::Provider(format!("math_stackexchange: {e}")))?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| MathRagError::Provider(format!("math_stackexchange: {e}")))?;

        let mut results = Vec::new();
        if let Some(items) = data["items"].as_array() {
            for item in items {
                let score = item["score"].as_i64().unwrap_or(0);
                let answer_count = item["answer_count"].as_i64().unwrap_or(0);
                let mut snippet = format!("Score: {score} | Answers: {answer_count}");
                if item["is_answered"].as_bool().unwrap_or(false) {
                    snippet.push_str(" | Answered");
                }

                results.push(WebSnippet {
                    title: strip_html_tags(item["title"].as_str().unwrap_or_default()),
                    url: item["link"].as_str().unwrap_or_default().to_string(),
                    snippet,
                    source: self.name().to_string(),
                });
            }
        }

        Ok(results)
    }
}

/// Remove HTML tags and decode the handful of entities the search APIs emit.
fn strip_html_tags(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => output.push(c),
            _ => {}
        }
    }
    output
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(
            strip_html_tags("<span class=\"match\">derivative</span> of sin"),
            "derivative of sin"
        );
        assert_eq!(strip_html_tags("a &amp; b"), "a & b");
        assert_eq!(strip_html_tags("plain text"), "plain text");
    }
}
