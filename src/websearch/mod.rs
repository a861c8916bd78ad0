//! Web search module
//!
//! Provider adapters plus the aggregator that fans queries out to all of
//! them concurrently and merges the results into scored [`SearchResult`]s.

pub mod aggregator;
pub mod providers;

pub use aggregator::WebSearchAggregator;
pub use providers::build_http_client;
pub use providers::DuckDuckGoProvider;
pub use providers::MathStackExchangeProvider;
pub use providers::SearchProvider;
pub use providers::WikipediaProvider;

use std::sync::Arc;
use std::time::Duration;

use crate::config::WebSearchConfig;
use crate::errors::Result;

/// Build the default aggregator with all shipped providers registered.
pub fn default_aggregator(config: &WebSearchConfig) -> Result<WebSearchAggregator> {
    let client = build_http_client(config.provider_timeout_secs)?;
    let providers: Vec<Arc<dyn SearchProvider>> = vec![
        Arc::new(DuckDuckGoProvider::new(client.clone())),
        Arc::new(WikipediaProvider::new(client.clone())),
        Arc::new(MathStackExchangeProvider::new(client)),
    ];

    Ok(WebSearchAggregator::new(
        providers,
        Duration::from_secs(config.provider_timeout_secs),
        config.result_cap,
    ))
}
