use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::cdf;
use crate::client::ArmClient;
use crate::error::ArmError;
use crate::timerange::TimeRange;

/// Parameters for the `query_live_data` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueryLiveDataParams {
    /// Datastream to query, e.g. `sgpmetE11.b1`.
    pub datastream: String,
    /// Window start, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`.
    /// Defaults to one hour before now.
    pub start_time: Option<String>,
    /// Window end, same forms. Defaults to now.
    pub end_time: Option<String>,
}

/// Parameters for the `return_cdf_data` tool.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReturnCdfDataParams {
    /// Archive file to download, e.g. `nsametC1.b1.20200101.000000.cdf`.
    pub cdf_file: String,
    /// Name of the variable to extract from the file.
    pub variable: String,
}

/// The MCP tool surface over the ARM Live Data archive.
///
/// All shared state is immutable, so concurrent tool calls from the hosting
/// protocol server are independent; each call is a single request/response
/// with no partial results.
#[derive(Clone)]
pub struct ArmLiveServer {
    client: Arc<ArmClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl ArmLiveServer {
    pub fn new(client: ArmClient) -> Self {
        Self {
            client: Arc::new(client),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Query the ARM Live Data archive for a datastream's metadata and file listing over a time window"
    )]
    async fn query_live_data(
        &self,
        Parameters(params): Parameters<QueryLiveDataParams>,
    ) -> Result<CallToolResult, McpError> {
        let range = TimeRange::resolve(params.start_time.as_deref(), params.end_time.as_deref())
            .map_err(tool_error)?;
        let value = self
            .client
            .query(&params.datastream, &range)
            .await
            .map_err(tool_error)?;
        json_content(&value)
    }

    #[tool(
        description = "Download a netCDF file from the ARM Live Data archive and return one variable's full time series as numbers"
    )]
    async fn return_cdf_data(
        &self,
        Parameters(params): Parameters<ReturnCdfDataParams>,
    ) -> Result<CallToolResult, McpError> {
        let variable = params.variable.trim();
        if variable.is_empty() {
            return Err(tool_error(ArmError::Validation(
                "variable must not be empty".to_string(),
            )));
        }

        let bytes = self
            .client
            .save_data(&params.cdf_file)
            .await
            .map_err(tool_error)?;
        let values =
            cdf::extract_variable(&bytes, params.cdf_file.trim(), variable).map_err(tool_error)?;
        json_content(&values)
    }
}

#[tool_handler]
impl ServerHandler for ArmLiveServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "ARM Live Data archive access: query a datastream's file listing over a time \
                 window, or download a netCDF file and extract one variable's time series."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn json_content<T: serde::Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

/// Maps a tool failure onto the protocol error, keeping the kind visible in
/// the structured data.
fn tool_error(err: ArmError) -> McpError {
    warn!(kind = err.kind(), "tool call failed: {err}");
    let data = Some(json!({ "kind": err.kind() }));
    let message = err.to_string();
    match err {
        ArmError::Validation(_) => McpError::invalid_params(message, data),
        ArmError::Remote(_) | ArmError::NotFound(_) | ArmError::Format(_) => {
            McpError::internal_error(message, data)
        }
    }
}
