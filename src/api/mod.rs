//! API server module: REST + SSE transport for the solving pipeline

pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use server::build_agent;
pub use server::serve_api;
