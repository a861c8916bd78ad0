use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub backtrace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Path to the JSON dataset of pre-solved problems
    pub dataset_path: String,
    /// Where the fitted vectorizer is persisted between runs
    pub vectorizer_path: String,
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Maximum records loaded from the dataset at ingestion
    #[serde(default = "default_ingest_limit")]
    pub ingest_limit: usize,
}

fn default_max_features() -> usize {
    384
}

fn default_top_k() -> usize {
    3
}

fn default_ingest_limit() -> usize {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,
    #[serde(default = "default_max_results_per_provider")]
    pub max_results_per_provider: usize,
    /// Hard cap on aggregated results regardless of per-provider limits
    #[serde(default = "default_result_cap")]
    pub result_cap: usize,
}

fn default_provider_timeout_secs() -> u64 {
    10
}

fn default_max_results_per_provider() -> usize {
    3
}

fn default_result_cap() -> usize {
    6
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: default_provider_timeout_secs(),
            max_results_per_provider: default_max_results_per_provider(),
            result_cap: default_result_cap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub llm_endpoint: String,
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
}

fn default_llm_model() -> String {
    "gemma3:27b".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Minimum first-pass KB score required to route to the knowledge base
    #[serde(default = "default_route_threshold")]
    pub route_threshold: f32,
    /// Confidence above which a draft is accepted without enhancement gating
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f32,
    /// Hard cap on routing passes (guarantees at most one retry)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Last-resort circuit breaker on total state transitions
    #[serde(default = "default_max_transitions")]
    pub max_transitions: usize,
    /// Upper bound on normalized solution steps
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_route_threshold() -> f32 {
    0.2
}

fn default_accept_threshold() -> f32 {
    0.6
}

fn default_max_iterations() -> usize {
    2
}

fn default_max_transitions() -> usize {
    15
}

fn default_max_steps() -> usize {
    8
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            route_threshold: default_route_threshold(),
            accept_threshold: default_accept_threshold(),
            max_iterations: default_max_iterations(),
            max_transitions: default_max_transitions(),
            max_steps: default_max_steps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub enable_cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub knowledge_base: KnowledgeBaseConfig,
    #[serde(default)]
    pub websearch: WebSearchConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(crate::MathRagError::Io)?;

        let config: AppConfig =
            toml::from_str(&content).map_err(crate::MathRagError::TomlParsing)?;

        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try to load from config.toml first, then fall back to config.example.toml
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            println!(
                "Warning: Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            Err(crate::MathRagError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "No config file found. Please create config.toml or config.example.toml",
            )))
        }
    }

    /// Get dataset path for knowledge-base ingestion
    #[must_use]
    pub fn dataset_path(&self) -> &str {
        &self.knowledge_base.dataset_path
    }

    /// Get vectorizer persistence path
    #[must_use]
    pub fn vectorizer_path(&self) -> &str {
        &self.knowledge_base.vectorizer_path
    }

    /// Get per-provider web search timeout in seconds
    #[must_use]
    pub fn provider_timeout_secs(&self) -> u64 {
        self.websearch.provider_timeout_secs
    }
}
