//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - The process-wide connection handle and its manager
//! - Read-only query execution
//! - Row projection to JSON maps
//! - Catalog introspection
//! - Identifier quoting

pub mod executor;
pub mod ident;
pub mod manager;
pub mod rows;
pub mod schema;

pub use executor::QueryExecutor;
pub use ident::quote_identifier;
pub use manager::{ConnectionHandle, ConnectionManager, DbPool};
pub use rows::RowToJson;
pub use schema::SchemaInspector;
