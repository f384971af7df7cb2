//! Small MCP server reachable over SSE and streamable HTTP, used to exercise the
//! inspector end to end.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::Router;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, InitializeRequestParam,
        InitializeResult, JsonObject, ListToolsResult, PaginatedRequestParam, ServerCapabilities,
        ServerInfo, Tool,
    },
    schemars::JsonSchema,
    service::{RequestContext, RoleServer},
    transport::{
        sse_server::SseServer,
        streamable_http_server::{
            session::local::LocalSessionManager, tower::StreamableHttpService,
        },
    },
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const STREAMABLE_HTTP_PATH: &str = "/mcp";
pub const SSE_PATH: &str = "/sse";

#[derive(Clone, Default)]
pub struct MockServer;

#[derive(Debug, Clone, Default, serde::Deserialize, JsonSchema)]
struct EchoArgs {
    /// Text to send back
    text: String,
    /// Optional note appended to the reply
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, JsonSchema)]
struct GreetArgs {
    /// Who to greet
    #[serde(default)]
    name: String,
}

#[derive(Debug, Clone, Default, serde::Deserialize, JsonSchema)]
struct EmptyArgs {}

fn schema_for<T: JsonSchema + 'static>() -> Arc<JsonObject> {
    rmcp::handler::server::common::cached_schema_for_type::<T>()
}

fn decode<T: serde::de::DeserializeOwned + Default>(arguments: Option<JsonObject>) -> T {
    arguments
        .and_then(|map| serde_json::from_value::<T>(serde_json::Value::Object(map)).ok())
        .unwrap_or_default()
}

impl MockServer {
    pub fn tools(&self) -> Vec<Tool> {
        vec![
            Tool::new(
                "echo",
                "Echo the supplied text back as a JSON document.",
                schema_for::<Parameters<EchoArgs>>(),
            ),
            Tool::new(
                "greet",
                "Reply with a plain-text greeting.",
                schema_for::<Parameters<GreetArgs>>(),
            ),
            Tool::new(
                "explode",
                "Always fails with an invalid-params protocol error.",
                schema_for::<Parameters<EmptyArgs>>(),
            ),
        ]
    }

    pub fn call(&self, request: CallToolRequestParam) -> Result<CallToolResult, ErrorData> {
        match request.name.as_ref() {
            "echo" => {
                let args: EchoArgs = decode(request.arguments);
                Ok(CallToolResult::structured(serde_json::json!({
                    "echoed": args.text,
                    "note": args.note,
                })))
            }
            "greet" => {
                let args: GreetArgs = decode(request.arguments);
                let name = if args.name.is_empty() {
                    "stranger"
                } else {
                    args.name.as_str()
                };
                Ok(CallToolResult::success(vec![Content::text(format!(
                    "hello, {name}"
                ))]))
            }
            "explode" => Err(ErrorData::invalid_params("explode always fails", None)),
            other => Err(ErrorData::invalid_params(
                format!("unknown tool: {other}"),
                None,
            )),
        }
    }
}

impl rmcp::ServerHandler for MockServer {
    fn initialize(
        &self,
        request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<InitializeResult, ErrorData>> + Send + '_ {
        async move {
            let capabilities = ServerCapabilities::builder().enable_tools().build();
            let info = ServerInfo {
                capabilities,
                server_info: Implementation {
                    name: "mock-mcp-server".into(),
                    title: Some("Mock MCP Server".into()),
                    version: env!("CARGO_PKG_VERSION").into(),
                    icons: None,
                    website_url: None,
                },
                protocol_version: request.protocol_version,
                instructions: None,
            };
            tracing::info!(client = %request.client_info.name, "initialize complete");
            Ok(info)
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        let tools = self.tools();
        async move {
            Ok(ListToolsResult {
                tools,
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        let response = self.call(request);
        async move { response }
    }
}

/// Serves SSE on `addr` (`/sse` plus the message endpoint) until the token is cancelled.
pub async fn serve_sse(addr: SocketAddr) -> Result<CancellationToken> {
    let ct = SseServer::serve(addr)
        .await?
        .with_service(MockServer::default);
    tracing::info!(%addr, "sse server listening");
    Ok(ct)
}

/// Serves streamable HTTP under `/mcp` on an already bound listener.
pub async fn serve_streamable_http(listener: TcpListener) -> Result<CancellationToken> {
    let addr = listener.local_addr()?;
    let http_service: StreamableHttpService<MockServer, LocalSessionManager> =
        StreamableHttpService::new(
            || Ok(MockServer::default()),
            Arc::new(LocalSessionManager::default()),
            Default::default(),
        );
    let router = Router::new().nest_service(STREAMABLE_HTTP_PATH, http_service);
    let ct = CancellationToken::new();
    tokio::spawn({
        let ct = ct.clone();
        async move {
            tracing::info!(%addr, "http server listening");
            let _ = axum::serve(listener, router)
                .with_graceful_shutdown(async move { ct.cancelled().await })
                .await;
        }
    });
    Ok(ct)
}
