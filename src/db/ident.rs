//! Identifier quoting.
//!
//! Table names cannot be bound as query parameters, so the sampling path has
//! to interpolate them into SQL text. Every identifier that reaches a query
//! string goes through this module first; quoting is mandatory, not optional.

use crate::models::DatabaseType;

/// Quote an identifier for the given dialect.
///
/// PostgreSQL and SQLite use double quotes with embedded quotes doubled;
/// MySQL uses backticks with embedded backticks doubled.
pub fn quote_identifier(name: &str, db_type: DatabaseType) -> String {
    match db_type {
        DatabaseType::MySQL => format!("`{}`", name.replace('`', "``")),
        DatabaseType::PostgreSQL | DatabaseType::SQLite => {
            format!("\"{}\"", name.replace('"', "\"\""))
        }
    }
}
