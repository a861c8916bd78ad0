//! API request and response types

use serde::Deserialize;
use serde::Serialize;

/// Minimum accepted question length after trimming.
pub const QUESTION_MIN_CHARS: usize = 2;

/// Maximum accepted question length after trimming.
pub const QUESTION_MAX_CHARS: usize = 2000;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// One prior message supplied by the client to seed a session
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

/// Solve request
#[derive(Debug, Deserialize)]
pub struct SolveRequest {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub conversation_history: Option<Vec<HistoryMessage>>,
}

impl SolveRequest {
    /// Validate the question at the transport boundary.
    pub fn validate(&self) -> Result<&str, String> {
        let question = self.question.trim();
        if question.len() < QUESTION_MIN_CHARS {
            return Err(format!(
                "Question must be at least {QUESTION_MIN_CHARS} characters"
            ));
        }
        if question.len() > QUESTION_MAX_CHARS {
            return Err(format!(
                "Question must be at most {QUESTION_MAX_CHARS} characters"
            ));
        }
        Ok(question)
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub conversation_count: usize,
    pub active_streams: usize,
}
