//! MCP service implementation using rmcp.
//!
//! Defines the EchoDbService struct with the four database tools exposed via
//! the MCP protocol using the rmcp framework's macros. Per the error
//! contract, execute_query and get_table_sample always answer with data
//! (rows or an error field); connect_database and get_schema map failures to
//! protocol errors.

use crate::db::ConnectionManager;
use crate::models::SchemaDescriptor;
use crate::tools::classifier::ClassifierPolicy;
use crate::tools::connect::{ConnectInput, ConnectOutput, ConnectToolHandler};
use crate::tools::query::{ExecuteQueryInput, QueryToolHandler, RowsOutput};
use crate::tools::sample::{GetTableSampleInput, SampleToolHandler};
use crate::tools::schema_tool::SchemaToolHandler;
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct EchoDbService {
    /// Shared owner of the process-wide connection handle
    connection_manager: Arc<ConnectionManager>,
    /// Read-only gate policy fixed at startup
    policy: ClassifierPolicy,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl EchoDbService {
    /// Create a new EchoDbService instance.
    pub fn new(connection_manager: Arc<ConnectionManager>, policy: ClassifierPolicy) -> Self {
        Self {
            connection_manager,
            policy,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl EchoDbService {
    #[tool(
        description = "Connect to a database using a URI (postgres://, mysql://, or sqlite:).\nReplaces any existing connection. Validates reachability before accepting.\nNot needed when the server was started with DATABASE_URI."
    )]
    async fn connect_database(
        &self,
        Parameters(input): Parameters<ConnectInput>,
    ) -> Result<Json<ConnectOutput>, McpError> {
        let handler = ConnectToolHandler::new(self.connection_manager.clone());
        handler
            .connect_database(input)
            .await
            .map(Json)
            .map_err(McpError::from)
    }

    #[tool(
        description = "Get the database schema: tables with columns (name, type, nullable, default), primary keys, foreign keys, and indexes.\nAlways reads the live catalog. Requires a connection."
    )]
    async fn get_schema(&self) -> Result<Json<SchemaDescriptor>, McpError> {
        let handler = SchemaToolHandler::new(self.connection_manager.clone());
        handler.get_schema().await.map(Json).map_err(McpError::from)
    }

    #[tool(
        description = "Execute a single read-only SELECT statement and return rows as JSON objects.\nAnything that is not a single SELECT (writes, DDL, stacked statements) is denied.\nResults are capped; a truncated flag is set when rows were dropped.\nFailures are returned in the 'error' field, never as a protocol error."
    )]
    async fn execute_query(
        &self,
        Parameters(input): Parameters<ExecuteQueryInput>,
    ) -> Json<RowsOutput> {
        let handler = QueryToolHandler::new(self.connection_manager.clone(), self.policy);
        Json(handler.execute_query(input).await)
    }

    #[tool(
        description = "Fetch up to `limit` rows from a table (default 10).\nThe table name is validated against the live catalog; unknown tables are reported in the 'error' field, never as a protocol error."
    )]
    async fn get_table_sample(
        &self,
        Parameters(input): Parameters<GetTableSampleInput>,
    ) -> Json<RowsOutput> {
        let handler = SampleToolHandler::new(self.connection_manager.clone(), self.policy);
        Json(handler.get_table_sample(input).await)
    }
}

#[tool_handler]
impl ServerHandler for EchoDbService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "echodb-mcp-server".to_owned(),
                title: Some("EchoDB MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only database tools for answering questions about SQL databases.\n\
                \n\
                ## Workflow\n\
                1. If the server was started without DATABASE_URI, call `connect_database` first\n\
                2. Call `get_schema` to learn tables, columns, keys, and indexes\n\
                3. Use `get_table_sample` to see example rows from a table\n\
                4. Use `execute_query` with a single SELECT statement for everything else\n\
                \n\
                ## Rules\n\
                - Only single SELECT statements are executed; INSERT/UPDATE/DELETE/DDL and\n\
                  stacked statements are denied\n\
                - Results are capped; check the `truncated` flag and narrow the query if set\n\
                - `execute_query` and `get_table_sample` report failures in the `error`\n\
                  field of their result - read it and adjust the query instead of retrying\n\
                  verbatim"
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> EchoDbService {
        let manager = Arc::new(ConnectionManager::new(None));
        EchoDbService::new(manager, ClassifierPolicy::default())
    }

    #[test]
    fn test_service_creation() {
        let _service = create_test_service();
    }

    #[test]
    fn test_server_info() {
        let service = create_test_service();
        let info = service.get_info();
        assert!(!info.server_info.name.is_empty());
        assert!(info.capabilities.tools.is_some());
        assert!(info.instructions.unwrap().contains("SELECT"));
    }
}
