use std::convert::Infallible;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use loanpro_mcp_runtime::parse_error_response;
use serde::Deserialize;
use serde_json::Value;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::routes::mcp_http::reply_payload;
use crate::state::{AppState, Sessions};

pub const SSE_PATH: &str = "/sse";
pub const MESSAGES_PATH: &str = "/messages";
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub fn router() -> Router<AppState> {
    Router::new()
        .route(SSE_PATH, get(sse_connect))
        .route(MESSAGES_PATH, post(sse_message))
}

/// Removes the session once the event stream is dropped.
struct SessionGuard {
    sessions: Sessions,
    id: Uuid,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.sessions.close(&self.id) {
            tracing::info!(event = "mcp_sse_session_closed", session_id = %self.id);
        }
    }
}

async fn sse_connect(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let (session_id, receiver) = state.sessions.open();
    tracing::info!(event = "mcp_sse_session_opened", session_id = %session_id);

    let guard = SessionGuard {
        sessions: state.sessions.clone(),
        id: session_id,
    };
    let endpoint = SseEvent::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?sessionId={session_id}"));

    let messages = UnboundedReceiverStream::new(receiver).filter_map(move |message| {
        let _guard = &guard;
        match SseEvent::default().event("message").json_data(&message) {
            Ok(event) => Some(Ok::<_, Infallible>(event)),
            Err(err) => {
                tracing::error!(
                    event = "mcp_sse_serialize_failed",
                    session_id = %session_id,
                    error = %err,
                );
                None
            }
        }
    });

    Sse::new(tokio_stream::once(Ok(endpoint)).chain(messages))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageQuery {
    session_id: Option<String>,
}

async fn sse_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(session_id) = query
        .session_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    else {
        return (StatusCode::BAD_REQUEST, "missing or invalid sessionId").into_response();
    };
    let Some(sender) = state.sessions.sender(&session_id) else {
        return (StatusCode::NOT_FOUND, "session not found").into_response();
    };

    let incoming: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(event = "mcp_sse_parse_error", session_id = %session_id, error = %err);
            return (StatusCode::BAD_REQUEST, Json(parse_error_response())).into_response();
        }
    };

    let server = state.server.clone();
    tokio::spawn(async move {
        let batch = incoming.is_array();
        let responses = server.handle_message(incoming).await;
        if let Some(payload) = reply_payload(batch, responses) {
            if sender.send(payload).is_err() {
                tracing::debug!(event = "mcp_sse_response_discarded", session_id = %session_id);
            }
        }
    });

    StatusCode::ACCEPTED.into_response()
}
