//! Mutable per-request routing state

use std::time::Instant;

use crate::models::Route;

/// Scratch state threaded through one pass of the routing state machine.
///
/// Created fresh per request and dropped when the solution is finalized;
/// nothing here outlives the solve.
pub struct RoutingContext {
    pub question: String,
    pub iteration_count: usize,
    pub route_decision: Option<Route>,
    pub route_confidence: f32,
    pub accumulated_errors: Vec<String>,
    pub started: Instant,
}

impl RoutingContext {
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            iteration_count: 0,
            route_decision: None,
            route_confidence: 0.0,
            accumulated_errors: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Record a recoverable error for diagnostics without aborting the pass.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.accumulated_errors.push(message.into());
    }

    /// Milliseconds elapsed since the request entered the machine.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_context_starts_at_iteration_zero() {
        let context = RoutingContext::new("Solve x + 1 = 2");
        assert_eq!(context.iteration_count, 0);
        assert!(context.route_decision.is_none());
        assert!(context.accumulated_errors.is_empty());
    }

    #[test]
    fn test_record_error_accumulates() {
        let mut context = RoutingContext::new("q");
        context.record_error("first");
        context.record_error("second");
        assert_eq!(context.accumulated_errors, vec!["first", "second"]);
    }
}
