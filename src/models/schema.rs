//! Schema Descriptor data models.
//!
//! These types mirror the catalog metadata surfaced to the agent: tables,
//! columns, primary keys, foreign keys, and indexes. Descriptors are read
//! fresh from the catalog on every request; nothing in this module caches.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured catalog metadata for the connected database.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDescriptor {
    pub tables: Vec<TableSchema>,
}

impl SchemaDescriptor {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Names of all tables in the descriptor.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
    /// Primary key column names, in key order. Empty if the table has none.
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<IndexInfo>,
}

impl TableSchema {
    /// Create a table schema with no columns or constraints yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDefinition {
    pub name: String,
    /// Full database type (e.g., `varchar(30)`, `bigint unsigned`)
    pub data_type: String,
    pub nullable: bool,
    /// Default expression as reported by the catalog, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ColumnDefinition {
    /// Create a new column definition.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
            default: None,
        }
    }

    /// Set the default expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A foreign key constraint, possibly spanning multiple columns.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKey {
    pub constrained_columns: Vec<String>,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub column_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_lookup() {
        let descriptor = SchemaDescriptor {
            tables: vec![
                TableSchema::new("users"),
                TableSchema::new("orders"),
            ],
        };
        assert!(descriptor.table("users").is_some());
        assert!(descriptor.table("missing").is_none());
        assert_eq!(descriptor.table_names(), vec!["users", "orders"]);
    }

    #[test]
    fn test_column_default_serialization() {
        let col = ColumnDefinition::new("id", "INTEGER", false);
        let json = serde_json::to_value(&col).unwrap();
        assert!(json.get("default").is_none());

        let col = col.with_default("0");
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["default"], "0");
    }
}
