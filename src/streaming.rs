//! Per-request event streaming
//!
//! The state machine publishes progress events here; a transport layer
//! consumes them in publish order. Publishing to a session without an open
//! sink is a silent no-op: this is a best-effort side channel, not a
//! guaranteed-delivery bus, and it must never block or fail the producer.

use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::models::Solution;
use crate::models::SolutionStep;

/// Typed progress events emitted during one solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Connected {
        session_id: String,
    },
    ProcessingStarted {
        message: String,
        question: String,
    },
    RoutingResult {
        route: String,
        confidence: f32,
    },
    StepGenerated {
        step_number: usize,
        step_data: SolutionStep,
        total_steps: usize,
    },
    SolutionComplete {
        data: Solution,
    },
    Error {
        message: String,
    },
}

impl StreamEvent {
    /// Wire-level event name, matching the serde tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::ProcessingStarted { .. } => "processing_started",
            Self::RoutingResult { .. } => "routing_result",
            Self::StepGenerated { .. } => "step_generated",
            Self::SolutionComplete { .. } => "solution_complete",
            Self::Error { .. } => "error",
        }
    }
}

/// Manager of per-session ordered event channels.
///
/// Events published for one session reach its consumer in publish order;
/// there is no ordering guarantee across sessions.
pub struct StreamManager {
    streams: DashMap<String, mpsc::UnboundedSender<StreamEvent>>,
}

impl StreamManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: DashMap::new(),
        }
    }

    /// Open an event sink for a session, returning the consumer end.
    ///
    /// Opening a session that already has a sink replaces it; the previous
    /// consumer's channel closes.
    pub fn open(&self, session_id: &str) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.streams.insert(session_id.to_string(), tx);
        debug!("Opened stream for session: {}", session_id);
        rx
    }

    /// Publish an event to a session's sink, if one is open.
    ///
    /// Never blocks and never errors: with no open sink (or a dropped
    /// consumer) the event is discarded.
    pub fn publish(&self, session_id: &str, event: StreamEvent) {
        if let Some(sender) = self.streams.get(session_id) {
            // A closed receiver means the consumer went away; drop the event
            let _ = sender.send(event);
        }
    }

    /// Release a session's sink. Further publishes become no-ops.
    pub fn close(&self, session_id: &str) {
        if self.streams.remove(session_id).is_some() {
            debug!("Closed stream for session: {}", session_id);
        }
    }

    /// Number of sessions with an open sink.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.streams.len()
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_delivered_in_publish_order() {
        let manager = StreamManager::new();
        let mut rx = manager.open("s1");

        for step in 1..=3 {
            manager.publish(
                "s1",
                StreamEvent::StepGenerated {
                    step_number: step,
                    step_data: SolutionStep::new(step, format!("step {step}")),
                    total_steps: 3,
                },
            );
        }
        manager.close("s1");

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            if let StreamEvent::StepGenerated { step_number, .. } = event {
                seen.push(step_number);
            }
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_publish_without_sink_is_noop() {
        let manager = StreamManager::new();
        // No open(); must not panic or block
        manager.publish(
            "missing",
            StreamEvent::Error {
                message: "ignored".to_string(),
            },
        );
        assert_eq!(manager.active_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_after_close_is_noop() {
        let manager = StreamManager::new();
        let rx = manager.open("s1");
        manager.close("s1");
        drop(rx);

        manager.publish(
            "s1",
            StreamEvent::Connected {
                session_id: "s1".to_string(),
            },
        );
        assert_eq!(manager.active_count(), 0);
    }
}
