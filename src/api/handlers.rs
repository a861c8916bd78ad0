//! API request handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::response::Sse;
use axum::Json;
use futures::stream::Stream;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::error;
use tracing::info;

use crate::agent::MathAgent;
use crate::api::types::ApiResponse;
use crate::api::types::HealthResponse;
use crate::api::types::SolveRequest;
use crate::session::SessionContext;
use crate::session::SessionStore;
use crate::streaming::StreamEvent;
use crate::streaming::StreamManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<MathAgent>,
    pub sessions: Arc<SessionStore>,
    pub streams: Arc<StreamManager>,
    /// One solve at a time across the whole process
    pub solve_gate: Arc<Mutex<()>>,
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        conversation_count: state.sessions.session_count(),
        active_streams: state.streams.active_count(),
    }))
}

/// Session context lookup, mostly useful for debugging clients
pub async fn get_context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionContext>>, StatusCode> {
    state
        .sessions
        .get(&session_id)
        .map(|context| Json(ApiResponse::success(context)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// Solve a question, streaming progress as server-sent events
pub async fn solve(
    State(state): State<AppState>,
    Json(request): Json<SolveRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<ApiResponse<()>>)>
{
    let question = match request.validate() {
        Ok(question) => question.to_string(),
        Err(message) => {
            return Err((StatusCode::BAD_REQUEST, Json(ApiResponse::error(message))));
        }
    };

    let session_id = request
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!("POST /api/solve session={} question={}", session_id, question);

    // Client-supplied history only seeds a session that has none yet
    if let Some(history) = request.conversation_history {
        if !state.sessions.has_history(&session_id) {
            for message in history {
                state
                    .sessions
                    .append(&session_id, &message.role, message.content);
            }
        }
    }

    let receiver = state.streams.open(&session_id);
    state.streams.publish(
        &session_id,
        StreamEvent::Connected {
            session_id: session_id.clone(),
        },
    );

    let task_state = state.clone();
    let task_session = session_id.clone();
    tokio::spawn(async move {
        let _guard = task_state.solve_gate.lock().await;

        let solution = task_state
            .agent
            .solve_streaming(&question, &task_state.streams, &task_session)
            .await;

        task_state.sessions.append(&task_session, "user", question);
        task_state
            .sessions
            .append(&task_session, "assistant", solution.final_answer.clone());

        task_state.streams.close(&task_session);
    });

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        receiver.recv().await.map(|event| (event, receiver))
    })
    .map(|event| Ok::<_, Infallible>(encode_event(&event)));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn encode_event(event: &StreamEvent) -> Event {
    match Event::default().event(event.name()).json_data(event) {
        Ok(encoded) => encoded,
        Err(e) => {
            error!("Failed to encode stream event: {}", e);
            Event::default()
                .event("error")
                .data("{\"type\":\"error\",\"message\":\"event encoding failed\"}")
        }
    }
}
