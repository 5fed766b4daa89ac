use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use loanpro_mcp_runtime::parse_error_response;
use serde_json::Value;

use crate::state::AppState;

pub const MCP_PATH: &str = "/mcp";

pub fn router() -> Router<AppState> {
    Router::new().route(MCP_PATH, post(mcp_post).get(mcp_get))
}

async fn mcp_get() -> Response {
    StatusCode::METHOD_NOT_ALLOWED.into_response()
}

async fn mcp_post(State(state): State<AppState>, body: Bytes) -> Response {
    let incoming: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(event = "mcp_http_parse_error", error = %err);
            return (StatusCode::OK, Json(parse_error_response())).into_response();
        }
    };

    let batch = incoming.is_array();
    let responses = state.server.handle_message(incoming).await;
    match reply_payload(batch, responses) {
        Some(payload) => (StatusCode::OK, Json(payload)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Collapses handler output into one JSON body. `None` means nothing to send.
pub(crate) fn reply_payload(batch: bool, mut responses: Vec<Value>) -> Option<Value> {
    if responses.is_empty() {
        return None;
    }
    if !batch && responses.len() == 1 {
        return responses.pop();
    }
    Some(Value::Array(responses))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::state::HttpTransport;
    use crate::test_support::offline_state;

    async fn post_mcp(body: &str) -> (StatusCode, Vec<u8>) {
        let app = crate::router(offline_state(HttpTransport::Http), &[]);
        let response = app
            .oneshot(
                Request::post(MCP_PATH)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn request_gets_json_response() {
        let (status, body) = post_mcp(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));
    }

    #[tokio::test]
    async fn notification_is_accepted_without_body() {
        let (status, body) =
            post_mcp(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error_with_ok_status() {
        let (status, body) = post_mcp("{not json").await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn batch_returns_array() {
        let (status, body) = post_mcp(
            r#"[{"jsonrpc":"2.0","id":"a","method":"ping"},{"jsonrpc":"2.0","method":"initialized"}]"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["id"], "a");
    }

    #[tokio::test]
    async fn get_is_not_allowed() {
        let app = crate::router(offline_state(HttpTransport::Http), &[]);
        let response = app
            .oneshot(Request::get(MCP_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn preflight_allows_post() {
        let app = crate::router(offline_state(HttpTransport::Http), &[]);
        let response = app
            .oneshot(
                Request::options(MCP_PATH)
                    .header(header::ORIGIN, "https://client.example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
        let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap()
            .to_string();
        assert!(methods.contains("POST"));
    }

    #[test]
    fn reply_payload_shapes() {
        assert_eq!(reply_payload(false, Vec::new()), None);
        assert_eq!(reply_payload(false, vec![json!(1)]), Some(json!(1)));
        assert_eq!(reply_payload(true, vec![json!(1)]), Some(json!([1])));
        assert_eq!(
            reply_payload(false, vec![json!(1), json!(2)]),
            Some(json!([1, 2]))
        );
    }
}
