//! Query execution tool.
//!
//! Implements the execute_query MCP tool. The statement passes through the
//! read-only gate before any network round-trip; rejected statements and
//! driver failures alike come back as `{error}` data, never as protocol
//! faults — the calling agent must be able to observe the failure and
//! reformulate.

use crate::db::{ConnectionManager, QueryExecutor};
use crate::error::{DbError, DbResult};
use crate::models::{ColumnMetadata, QueryResult};
use crate::tools::classifier::{ClassifierPolicy, Verdict, classify};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

/// Input for the execute_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExecuteQueryInput {
    /// A single SQL SELECT statement. Anything else is denied.
    pub sql: String,
}

/// Rows-or-error output shared by execute_query and get_table_sample.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct RowsOutput {
    /// Column metadata (name, type, nullable); empty on error or empty set
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<ColumnMetadata>,
    /// Result rows as column-name -> value maps, capped at the shared limit
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Number of rows returned
    pub row_count: usize,
    /// True if rows beyond the cap were dropped
    pub truncated: bool,
    /// Query execution time in milliseconds; absent on error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Set when the request failed; describes the denial or driver failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RowsOutput {
    /// Build output from a successful result set.
    pub fn from_result(result: QueryResult) -> Self {
        let row_count = result.rows.len();
        Self {
            columns: result.columns,
            rows: result.rows,
            row_count,
            truncated: result.truncated,
            execution_time_ms: Some(result.execution_time_ms),
            error: None,
        }
    }

    /// Build output carrying a failure as data.
    pub fn from_error(err: DbError) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: 0,
            truncated: false,
            execution_time_ms: None,
            error: Some(err.to_string()),
        }
    }

    /// True if the output carries an error instead of rows.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Handler for read-only query execution.
pub struct QueryToolHandler {
    connection_manager: Arc<ConnectionManager>,
    policy: ClassifierPolicy,
    executor: QueryExecutor,
}

impl QueryToolHandler {
    /// Create a new query tool handler with the given classifier policy.
    pub fn new(connection_manager: Arc<ConnectionManager>, policy: ClassifierPolicy) -> Self {
        Self {
            connection_manager,
            policy,
            executor: QueryExecutor::new(policy),
        }
    }

    /// Handle the execute_query tool call. Infallible by contract: every
    /// failure path is folded into the output.
    pub async fn execute_query(&self, input: ExecuteQueryInput) -> RowsOutput {
        match self.run(&input.sql).await {
            Ok(result) => {
                info!(
                    row_count = result.rows.len(),
                    truncated = result.truncated,
                    execution_time_ms = result.execution_time_ms,
                    "Query executed"
                );
                RowsOutput::from_result(result)
            }
            Err(err) => {
                info!(error = %err, "Query denied or failed");
                RowsOutput::from_error(err)
            }
        }
    }

    async fn run(&self, sql: &str) -> DbResult<QueryResult> {
        // Gate before touching the connection: a denied statement never
        // costs a network round-trip (or a lazy connect).
        if let Verdict::Reject(reason) = classify(sql, &self.policy) {
            return Err(DbError::validation(reason.message()));
        }
        let handle = self.connection_manager.ensure().await?;
        self.executor.execute(&handle, sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconnected_query_is_error_data() {
        let manager = Arc::new(ConnectionManager::new(None));
        let handler = QueryToolHandler::new(manager, ClassifierPolicy::default());
        let output = handler
            .execute_query(ExecuteQueryInput {
                sql: "SELECT 1".to_string(),
            })
            .await;
        assert!(output.is_error());
        assert!(output.error.unwrap().contains("Not connected"));
        assert_eq!(output.row_count, 0);
    }

    #[tokio::test]
    async fn test_rejected_statement_is_error_data_before_connection() {
        // Rejection happens at the application layer: even with no
        // connection configured, a write statement is denied as such.
        let manager = Arc::new(ConnectionManager::new(None));
        let handler = QueryToolHandler::new(manager, ClassifierPolicy::default());
        let output = handler
            .execute_query(ExecuteQueryInput {
                sql: "DROP TABLE users".to_string(),
            })
            .await;
        assert!(output.is_error());
        // The denial names the gate, not the missing connection
        assert!(output.error.unwrap().contains("SELECT"));
    }

    #[test]
    fn test_rows_output_error_serialization() {
        let output = RowsOutput::from_error(DbError::validation(
            "Only single SELECT statements are allowed.",
        ));
        let json = serde_json::to_value(&output).unwrap();
        assert!(json["error"].as_str().unwrap().contains("SELECT"));
        assert!(json.get("columns").is_none());
        assert!(json.get("execution_time_ms").is_none());
    }
}
