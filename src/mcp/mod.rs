//! MCP protocol layer.
//!
//! This module exposes the database tools via the Model Context Protocol
//! using the rmcp framework.

pub mod service;

pub use service::EchoDbService;
