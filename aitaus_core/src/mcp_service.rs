//! # Aitaus MCP Service Implementation
//!
//! `AitausMcpService` implements the `rmcp::ServerHandler` trait and is the
//! single entry point for MCP clients. It exposes exactly two tools:
//!
//! - **`execute_command`**: run an allow-listed command inside the workspace.
//! - **`change_directory`**: move the sandbox's virtual working directory.
//!
//! Sandbox rejections are not protocol errors: they are returned as
//! successful tool results carrying a JSON object with an `error` field, so
//! the client LLM sees the rejection text verbatim and can correct itself.
//! Protocol errors are reserved for malformed requests (unknown tool,
//! undecodable arguments).

use std::sync::Arc;

use rmcp::{
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, ErrorData as McpError, Implementation,
        ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
        Tool, ToolsCapability,
    },
    service::{NotificationContext, RequestContext, RoleServer},
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::executor::CommandRequest;
use crate::sandbox::Sandbox;

/// Request payload for the `change_directory` tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NavigationRequest {
    /// Target directory: relative, absolute (in-workspace), `..`, `~`, or
    /// `~/sub`. Empty means the workspace root.
    #[serde(default)]
    pub path: String,
}

const SERVER_INSTRUCTIONS: &str = "Command execution is confined to a single workspace \
directory. Paths are resolved against a virtual working directory; `~` means the workspace \
root, not the user's home. Arguments containing shell metacharacters, substitution, variable \
expansion, or `..` are rejected before anything runs. Use `change_directory` to move around \
and `execute_command` for allow-listed commands.";

/// The MCP server handler wrapping one [`Sandbox`].
#[derive(Clone)]
pub struct AitausMcpService {
    pub sandbox: Arc<Sandbox>,
}

impl AitausMcpService {
    pub fn new(sandbox: Arc<Sandbox>) -> Self {
        Self { sandbox }
    }

    async fn handle_execute(
        &self,
        params: CallToolRequestParam,
    ) -> Result<CallToolResult, McpError> {
        let args = Value::Object(params.arguments.unwrap_or_default());
        let request: CommandRequest = serde_json::from_value(args)
            .map_err(|e| McpError::invalid_params(format!("invalid arguments: {e}"), None))?;

        match self.sandbox.execute_command(&request).await {
            Ok(result) => Ok(CallToolResult::success(vec![json_content(&result)?])),
            Err(e) => {
                tracing::warn!("execute_command rejected: {} ({})", e, e.category());
                let body = serde_json::json!({ "error": e.to_string() });
                Ok(CallToolResult::success(vec![json_content(&body)?]))
            }
        }
    }

    async fn handle_change_directory(
        &self,
        params: CallToolRequestParam,
    ) -> Result<CallToolResult, McpError> {
        let args = Value::Object(params.arguments.unwrap_or_default());
        let request: NavigationRequest = serde_json::from_value(args)
            .map_err(|e| McpError::invalid_params(format!("invalid arguments: {e}"), None))?;

        match self.sandbox.change_directory(&request.path).await {
            Ok(outcome) => Ok(CallToolResult::success(vec![json_content(&outcome)?])),
            Err(e) => {
                tracing::warn!("change_directory rejected: {} ({})", e, e.category());
                let body = serde_json::json!({ "error": e.to_string() });
                Ok(CallToolResult::success(vec![json_content(&body)?]))
            }
        }
    }
}

fn json_content<T: serde::Serialize>(value: &T) -> Result<Content, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("failed to encode result: {e}"), None))?;
    Ok(Content::text(text))
}

/// Generate a tool input schema from a `schemars`-deriving request type.
fn input_schema_for<T: JsonSchema>() -> Arc<Map<String, Value>> {
    let schema = schemars::schema_for!(T);
    match serde_json::to_value(schema) {
        Ok(Value::Object(map)) => Arc::new(map),
        _ => Arc::new(Map::new()),
    }
}

impl ServerHandler for AitausMcpService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                title: Some(env!("CARGO_PKG_NAME").to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
        }
    }

    fn on_initialized(
        &self,
        context: NotificationContext<RoleServer>,
    ) -> impl std::future::Future<Output = ()> + Send + '_ {
        async move {
            tracing::info!("Client connected: {context:?}");
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            let tools = vec![
                Tool {
                    name: "execute_command".into(),
                    title: Some("execute_command".to_string()),
                    icons: None,
                    description: Some(
                        "Execute an allow-listed command inside the workspace. Arguments are \
                         screened for shell metacharacters and absolute paths must stay inside \
                         the workspace. Returns stdout, stderr, exit_code and the working \
                         directory the command ran in."
                            .into(),
                    ),
                    input_schema: input_schema_for::<CommandRequest>(),
                    output_schema: None,
                    annotations: None,
                    meta: None,
                },
                Tool {
                    name: "change_directory".into(),
                    title: Some("change_directory".to_string()),
                    icons: None,
                    description: Some(
                        "Change the sandbox's virtual working directory. `~` is the workspace \
                         root; `~/sub`, relative paths and `..` are resolved against the \
                         current directory. A rejected change leaves the directory unchanged."
                            .into(),
                    ),
                    input_schema: input_schema_for::<NavigationRequest>(),
                    output_schema: None,
                    annotations: None,
                    meta: None,
                },
            ];

            Ok(ListToolsResult {
                meta: None,
                tools,
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            match params.name.as_ref() {
                "execute_command" => self.handle_execute(params).await,
                "change_directory" => self.handle_change_directory(params).await,
                other => Err(McpError::invalid_params(
                    format!("unknown tool '{other}'"),
                    None,
                )),
            }
        }
    }
}
