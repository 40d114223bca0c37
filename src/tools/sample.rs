//! Table sampling tool.
//!
//! Implements the get_table_sample MCP tool. The table name is the one place
//! a caller-supplied identifier enters a query string, so it is validated
//! against the live catalog first and quoted for the dialect; the limit is
//! bound as a parameter.

use crate::db::{ConnectionManager, QueryExecutor, SchemaInspector};
use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_SAMPLE_LIMIT, QueryResult};
use crate::tools::classifier::ClassifierPolicy;
use crate::tools::query::RowsOutput;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Input for the get_table_sample tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetTableSampleInput {
    /// Name of the table to sample. Must exist in the connected database.
    pub table_name: String,
    /// Maximum rows to return. Values <= 0 (or omitted) default to 10.
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Handler for bounded table sampling.
pub struct SampleToolHandler {
    connection_manager: Arc<ConnectionManager>,
    executor: QueryExecutor,
}

impl SampleToolHandler {
    /// Create a new sample tool handler.
    pub fn new(connection_manager: Arc<ConnectionManager>, policy: ClassifierPolicy) -> Self {
        Self {
            connection_manager,
            executor: QueryExecutor::new(policy),
        }
    }

    /// Handle the get_table_sample tool call. Infallible by contract: an
    /// unknown table (or any other failure) comes back as error data.
    pub async fn get_table_sample(&self, input: GetTableSampleInput) -> RowsOutput {
        match self.run(&input).await {
            Ok(result) => {
                info!(
                    table = %input.table_name,
                    row_count = result.rows.len(),
                    "Table sample fetched"
                );
                RowsOutput::from_result(result)
            }
            Err(err) => {
                info!(table = %input.table_name, error = %err, "Table sample failed");
                RowsOutput::from_error(err)
            }
        }
    }

    async fn run(&self, input: &GetTableSampleInput) -> DbResult<QueryResult> {
        let handle = self.connection_manager.ensure().await?;

        // Fetched fresh per call: validation against a cached list could
        // approve a table dropped since, or miss one just created.
        let tables = SchemaInspector::list_table_names(handle.pool()).await?;
        if !tables.iter().any(|t| t == &input.table_name) {
            return Err(DbError::unknown_table(&input.table_name));
        }

        let limit = match input.limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_SAMPLE_LIMIT,
        };

        self.executor.sample(&handle, &input.table_name, limit).await
    }
}
