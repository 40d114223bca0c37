//! Schema introspection tool.

use crate::db::{ConnectionManager, SchemaInspector};
use crate::error::DbResult;
use crate::models::SchemaDescriptor;
use std::sync::Arc;
use tracing::info;

/// Handler for the get_schema tool.
///
/// Unlike the row-returning tools, get_schema surfaces failures as protocol
/// errors: an unconnected server is a precondition failure the agent fixes
/// by calling connect_database, not a per-query negative result.
pub struct SchemaToolHandler {
    connection_manager: Arc<ConnectionManager>,
}

impl SchemaToolHandler {
    /// Create a new schema tool handler.
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }

    /// Build the Schema Descriptor from the live catalog.
    pub async fn get_schema(&self) -> DbResult<SchemaDescriptor> {
        let handle = self.connection_manager.ensure().await?;
        let descriptor = SchemaInspector::describe(handle.pool()).await?;
        info!(table_count = descriptor.tables.len(), "Schema introspected");
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    #[tokio::test]
    async fn test_unconnected_schema_is_configuration_error() {
        let manager = Arc::new(ConnectionManager::new(None));
        let handler = SchemaToolHandler::new(manager);
        let err = handler.get_schema().await.unwrap_err();
        assert!(matches!(err, DbError::Configuration { .. }));
    }
}
