//! EchoDB MCP Server - Main entry point.
//!
//! Exposes read-only database tools (connect, schema introspection, bounded
//! sampling, validated SELECT execution) to AI agents over MCP.

use clap::Parser;
use echodb_mcp_server::config::{Config, TransportMode};
use echodb_mcp_server::db::ConnectionManager;
use echodb_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr: stdout belongs to the stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    if config.enable_logs {
        init_tracing(&config);
    }

    info!(
        transport = %config.transport,
        "Starting EchoDB MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let connection_manager = Arc::new(ConnectionManager::new(config.database_uri.clone()));

    // Preconnect eagerly when a default URI is configured, so the first tool
    // call does not pay the connection cost. Failure is logged, not fatal:
    // the agent can still call connect_database later.
    if config.database_uri.is_some() {
        match connection_manager.ensure().await {
            Ok(_) => info!("Connected using DATABASE_URI from environment"),
            Err(e) => warn!(error = %e, "Failed to preconnect using DATABASE_URI"),
        }
    }

    let policy = config.classifier_policy();

    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(connection_manager, policy);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                connection_manager,
                policy,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
