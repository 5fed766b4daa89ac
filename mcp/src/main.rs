use std::net::SocketAddr;

use clap::{Parser, ValueEnum};
use loanpro_api::{AppState, HttpTransport};
use loanpro_mcp_runtime::{LoanProArgs, LoanProClient, McpServer};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "loanpro-mcp",
    version,
    about = "LoanPro MCP server: loan servicing tools over stdio, HTTP or SSE"
)]
struct Cli {
    #[command(flatten)]
    loanpro: LoanProArgs,

    /// Transport to serve
    #[arg(long, env = "MCP_TRANSPORT", value_enum, ignore_case = true, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Listen port for the http and sse transports
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// debug, info, warn or error (RUST_LOG takes precedence)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log line format on stderr: text or json
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: String,

    /// Comma-separated allowed CORS origins (empty allows any)
    #[arg(long, env = "MCP_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
    Sse,
}

impl Transport {
    fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Anything other than `json` logs as text.
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, LogFormat::parse(&cli.log_format));

    let code = run(cli).await;
    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    let client = match LoanProClient::new(cli.loanpro.client_config()) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(event = "client_config_invalid", error = %err);
            return 2;
        }
    };
    let server = McpServer::new(client);

    tracing::info!(
        event = "mcp_starting",
        transport = cli.transport.as_str(),
        api_url = %cli.loanpro.api_url,
        tenant_id = %cli.loanpro.tenant_id,
    );

    let result = match cli.transport {
        Transport::Stdio => server.serve_stdio().await,
        Transport::Http | Transport::Sse => {
            let transport = if cli.transport == Transport::Sse {
                HttpTransport::Sse
            } else {
                HttpTransport::Http
            };
            let app = loanpro_api::router(AppState::new(server, transport), &cli.cors_origins);
            let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
            loanpro_api::serve(addr, app).await
        }
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(event = "mcp_server_error", error = %err);
            1
        }
    }
}

/// Unknown levels fall back to info.
fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

// stdout carries protocol frames in stdio mode, so logs always go to stderr.
fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_ansi(false).with_writer(std::io::stderr))
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 7] = [
        "loanpro-mcp",
        "--api-url",
        "https://loanpro.example.com",
        "--api-key",
        "secret",
        "--tenant-id",
        "5200243",
    ];

    #[test]
    fn level_directive_is_case_insensitive_with_info_fallback() {
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive(" Warn "), "warn");
        assert_eq!(level_directive("error"), "error");
        assert_eq!(level_directive("verbose"), "info");
        assert_eq!(level_directive(""), "info");
    }

    #[test]
    fn cli_parses_transport_and_origins() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--transport",
            "SSE",
            "--port",
            "9090",
            "--cors-origins",
            "https://a.example.com,https://b.example.com",
            "--log-format",
            "json",
        ]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.transport, Transport::Sse);
        assert_eq!(cli.port, 9090);
        assert_eq!(LogFormat::parse(&cli.log_format), LogFormat::Json);
        assert_eq!(
            cli.cors_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert_eq!(cli.loanpro.tenant_id, "5200243");
    }

    #[test]
    fn unknown_log_format_falls_back_to_text() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--log-format", "logfmt"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(LogFormat::parse(&cli.log_format), LogFormat::Text);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
    }

    #[test]
    fn cli_rejects_unknown_transport() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--transport", "websocket"]);
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
