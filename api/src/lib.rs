//! HTTP and SSE transports for the LoanPro MCP server.

use std::net::SocketAddr;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod middleware;
pub mod routes;
pub mod state;

pub use state::{AppState, HttpTransport, Sessions};

/// Routes for the configured transport plus the info and health endpoints.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let transport_routes = match state.transport {
        HttpTransport::Http => routes::mcp_http::router(),
        HttpTransport::Sse => routes::sse::router(),
    };

    Router::new()
        .merge(routes::health::router())
        .merge(transport_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::build_cors_layer(cors_origins)),
        )
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(event = "http_listening", addr = %addr, "LoanPro MCP server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(event = "shutdown_signal_failed", error = %err);
        std::future::pending::<()>().await;
    }
    tracing::info!(event = "http_shutdown");
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use loanpro_mcp_runtime::{ClientConfig, LoanProClient, McpServer, NoopObserver};

    use crate::state::{AppState, HttpTransport};

    /// State whose client points at a closed port; only non-tool methods work.
    pub fn offline_state(transport: HttpTransport) -> AppState {
        let client = LoanProClient::new(ClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "token".to_string(),
            tenant_id: "1".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
        .with_observer(Arc::new(NoopObserver));
        AppState::new(McpServer::new(client), transport)
    }
}
