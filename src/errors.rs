use thiserror::Error;

#[derive(Error, Debug)]
pub enum MathRagError {
    #[error("Similarity index not ready: {0}")]
    IndexNotReady(String),

    #[error("Search provider error: {0}")]
    Provider(String),

    #[error("Generation failure: {0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MathRagError>;
