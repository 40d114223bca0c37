//! Data models for the EchoDB MCP Server.

pub mod connection;
pub mod query;
pub mod schema;

pub use connection::DatabaseType;
pub use query::{ColumnMetadata, DEFAULT_SAMPLE_LIMIT, MAX_RESULT_ROWS, QueryResult};
pub use schema::{ColumnDefinition, ForeignKey, IndexInfo, SchemaDescriptor, TableSchema};
