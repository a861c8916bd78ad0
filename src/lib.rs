pub mod agent;
pub mod api;
pub mod config;
pub mod errors;
pub mod kb;
pub mod llm;
pub mod logging;
pub mod models;
pub mod session;
pub mod streaming;
pub mod websearch;

pub use config::AppConfig;
pub use errors::*;
