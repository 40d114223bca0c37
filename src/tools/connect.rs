//! Database connection tool.

use crate::db::ConnectionManager;
use crate::error::DbResult;
use crate::models::DatabaseType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Input for the connect_database tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ConnectInput {
    /// Database connection URI (postgres://, mysql://, or sqlite:).
    /// Credentials embedded here are never logged.
    pub uri: String,
}

/// Output from the connect_database tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ConnectOutput {
    /// Always "connected" on success
    pub status: String,
    pub database_type: DatabaseType,
}

/// Handler for establishing or replacing the database connection.
pub struct ConnectToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl ConnectToolHandler {
    /// Create a new connect tool handler.
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Connect to the given URI, replacing any active connection.
    ///
    /// Reachability is validated with a SELECT 1 round-trip before the new
    /// handle becomes current; on failure the previous connection (if any)
    /// stays active.
    pub async fn connect_database(&self, input: ConnectInput) -> DbResult<ConnectOutput> {
        let handle = self.connection_manager.connect(&input.uri).await?;
        info!(db_type = %handle.db_type(), "connect_database succeeded");
        Ok(ConnectOutput {
            status: "connected".to_string(),
            database_type: handle.db_type(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    #[tokio::test]
    async fn test_connect_bad_scheme_is_connection_error() {
        let manager = Arc::new(ConnectionManager::new(None));
        let handler = ConnectToolHandler::new(manager);
        let err = handler
            .connect_database(ConnectInput {
                uri: "bogus://nowhere".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Connection { .. }));
    }

    #[test]
    fn test_connect_output_serialization() {
        let output = ConnectOutput {
            status: "connected".to_string(),
            database_type: DatabaseType::SQLite,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "connected");
        assert_eq!(json["database_type"], "sqlite");
    }
}
