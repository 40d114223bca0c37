//! EchoDB MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI agents
//! to answer questions about SQL databases (SQLite, PostgreSQL, MySQL) using
//! a strictly read-only tool surface: schema introspection, bounded row
//! sampling, and validated SELECT execution.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::EchoDbService;
