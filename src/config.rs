//! Configuration handling for the EchoDB MCP Server.
//!
//! Configuration comes from CLI arguments with environment variable
//! fallbacks. The default connection URI (`DATABASE_URI`) is deliberately
//! optional: when present the server preconnects eagerly at startup, and the
//! same URI backs lazy connection on first tool use; when absent the agent
//! must call connect_database.

use crate::tools::classifier::ClassifierPolicy;
use clap::{Parser, ValueEnum};

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Configuration for the EchoDB MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "echodb-mcp-server",
    about = "MCP server exposing read-only SQL database tools to AI agents",
    version,
    author
)]
pub struct Config {
    /// Default database connection URI. Optional: the connect_database tool
    /// can establish the connection at runtime instead. Never logged in full.
    #[arg(short = 'd', long = "database-uri", value_name = "URI", env = "DATABASE_URI")]
    pub database_uri: Option<String>,

    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Reject WITH (common-table-expression) prefixes in execute_query.
    /// By default both SELECT and WITH ... SELECT are accepted.
    #[arg(long, env = "ECHODB_REJECT_CTE")]
    pub reject_cte: bool,

    /// Additionally reject statements containing write keywords (INSERT,
    /// UPDATE, DELETE, DDL, GRANT/REVOKE) anywhere in their text. Stricter
    /// than the default prefix check and may deny legitimate queries whose
    /// string literals contain those words.
    #[arg(long, env = "ECHODB_KEYWORD_BLOCKLIST")]
    pub keyword_blocklist: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Enable logging output (disabled by default to avoid interfering with
    /// the stdio transport; logs go to stderr when enabled)
    #[arg(long, env = "MCP_ENABLE_LOGS")]
    pub enable_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            database_uri: None,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            reject_cte: false,
            keyword_blocklist: false,
            log_level: "info".to_string(),
            json_logs: false,
            enable_logs: false,
        }
    }

    /// Build the classifier policy selected by this configuration.
    pub fn classifier_policy(&self) -> ClassifierPolicy {
        ClassifierPolicy {
            allow_cte: !self.reject_cte,
            keyword_blocklist: self.keyword_blocklist,
        }
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.http_host, DEFAULT_HTTP_HOST);
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert!(config.database_uri.is_none());
    }

    #[test]
    fn test_http_bind_addr() {
        let config = Config {
            http_host: "0.0.0.0".to_string(),
            http_port: 3000,
            ..Config::default()
        };
        assert_eq!(config.http_bind_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_default_policy_accepts_cte_without_blocklist() {
        let policy = Config::default().classifier_policy();
        assert!(policy.allow_cte);
        assert!(!policy.keyword_blocklist);
    }

    #[test]
    fn test_policy_flags_flow_through() {
        let config = Config {
            reject_cte: true,
            keyword_blocklist: true,
            ..Config::default()
        };
        let policy = config.classifier_policy();
        assert!(!policy.allow_cte);
        assert!(policy.keyword_blocklist);
    }
}
