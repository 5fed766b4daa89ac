pub mod health;
pub mod mcp_http;
pub mod sse;
