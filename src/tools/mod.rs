//! MCP tool implementations.
//!
//! Four operations make up the tool surface: connect_database, get_schema,
//! execute_query, and get_table_sample. The two row-returning tools never
//! raise — their failures come back as error data the agent can read and
//! react to conversationally.

pub mod classifier;
pub mod connect;
pub mod query;
pub mod sample;
pub mod schema_tool;

pub use classifier::{ClassifierPolicy, RejectReason, Verdict, classify};
pub use connect::{ConnectInput, ConnectOutput, ConnectToolHandler};
pub use query::{ExecuteQueryInput, QueryToolHandler, RowsOutput};
pub use sample::{GetTableSampleInput, SampleToolHandler};
pub use schema_tool::SchemaToolHandler;
