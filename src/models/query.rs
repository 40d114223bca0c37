//! Query result data models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Maximum number of rows any query path returns. Shared by execute_query
/// and get_table_sample; excess rows are truncated, never an error.
pub const MAX_RESULT_ROWS: usize = 100;

/// Rows returned by get_table_sample when the caller passes a non-positive
/// limit.
pub const DEFAULT_SAMPLE_LIMIT: i64 = 10;

/// Column metadata as reported by the driver.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnMetadata {
    pub name: String,
    /// Database-specific type (e.g., "int8", "varchar", "TEXT")
    pub type_name: String,
    pub nullable: bool,
}

impl ColumnMetadata {
    /// Create new column metadata.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable,
        }
    }
}

/// A materialized, row-count-capped result set.
///
/// Rows are ordered column-name -> value maps, suitable for serialization as
/// they are; presentation (markdown tables etc.) belongs to the calling agent
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// True if more rows were available than the shared cap allowed.
    pub truncated: bool,
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create an empty result.
    pub fn empty(execution_time_ms: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            truncated: false,
            execution_time_ms,
        }
    }

    /// Get the number of rows in the result.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_result_empty() {
        let result = QueryResult::empty(10);
        assert!(result.is_empty());
        assert_eq!(result.row_count(), 0);
        assert!(!result.truncated);
    }

    #[test]
    fn test_column_metadata() {
        let col = ColumnMetadata::new("id", "INTEGER", false);
        assert_eq!(col.name, "id");
        assert_eq!(col.type_name, "INTEGER");
        assert!(!col.nullable);
    }
}
