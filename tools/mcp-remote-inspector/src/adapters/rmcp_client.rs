use async_trait::async_trait;
use rmcp::{
    RoleClient, ServiceExt,
    model::{
        CallToolRequestParam, ClientCapabilities, ClientInfo, Implementation, JsonObject,
        ProtocolVersion,
    },
    service::{RunningService, ServiceError},
    transport::{
        sse_client::SseClientTransport,
        streamable_http_client::{
            StreamableHttpClientTransport, StreamableHttpClientTransportConfig,
        },
    },
};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;

use crate::{
    app::protocol::{Connector, ProtocolSession, SessionHandle},
    domain::transport::TransportBinding,
    shared::{
        errors::{CallFailure, ConnectError, DiscoveryError},
        types::{CallRequest, TransportKind},
    },
};

/// Opens rmcp client sessions over SSE or streamable HTTP.
#[derive(Clone)]
pub struct RmcpConnector {
    client_info: ClientInfo,
    auth_token: Option<String>,
    http: reqwest::Client,
}

impl RmcpConnector {
    pub fn new(client_name: impl Into<String>) -> Self {
        let client_info = ClientInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: client_name.into(),
                title: None,
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
        };
        Self {
            client_info,
            auth_token: None,
            http: reqwest::Client::new(),
        }
    }

    /// Bearer token sent on streamable HTTP requests. rmcp's SSE client has no
    /// hook for it, so SSE connects without.
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|tok| !tok.trim().is_empty());
        self
    }

    async fn handshake(
        &self,
        binding: TransportBinding,
    ) -> Result<RunningService<RoleClient, ClientInfo>, ConnectError> {
        let url = binding.url.to_string();
        match binding.kind {
            TransportKind::Sse => {
                let transport = SseClientTransport::start(url)
                    .await
                    .map_err(|err| ConnectError::Rejected(err.to_string()))?;
                self.client_info
                    .clone()
                    .serve(transport)
                    .await
                    .map_err(|err| ConnectError::Rejected(err.to_string()))
            }
            TransportKind::StreamableHttp => {
                let mut cfg = StreamableHttpClientTransportConfig::with_uri(url);
                if let Some(tok) = &self.auth_token {
                    cfg = cfg.auth_header(tok);
                }
                let transport = StreamableHttpClientTransport::with_client(self.http.clone(), cfg);
                self.client_info
                    .clone()
                    .serve(transport)
                    .await
                    .map_err(|err| ConnectError::Rejected(err.to_string()))
            }
        }
    }
}

#[async_trait]
impl Connector for RmcpConnector {
    async fn connect(
        &self,
        binding: TransportBinding,
        handshake_timeout: Duration,
    ) -> Result<SessionHandle, ConnectError> {
        let service = timeout(handshake_timeout, self.handshake(binding))
            .await
            .map_err(|_| ConnectError::Timeout {
                timeout_ms: handshake_timeout.as_millis(),
            })??;
        if let Some(info) = service.peer_info() {
            tracing::debug!(
                server = %info.server_info.name,
                version = %info.server_info.version,
                "handshake complete"
            );
        }
        Ok(Arc::new(RmcpSession { service }))
    }
}

/// Dropping the running service cancels it, which releases the connection.
struct RmcpSession {
    service: RunningService<RoleClient, ClientInfo>,
}

#[async_trait]
impl ProtocolSession for RmcpSession {
    async fn list_tools(&self) -> Result<Value, DiscoveryError> {
        let result = self
            .service
            .list_tools(Default::default())
            .await
            .map_err(|err| DiscoveryError(err.to_string()))?;
        serde_json::to_value(&result).map_err(|err| DiscoveryError(err.to_string()))
    }

    async fn call_tool(&self, request: CallRequest) -> Result<Value, CallFailure> {
        let arguments: JsonObject = request
            .arguments
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: request.name.into(),
                arguments: Some(arguments),
            })
            .await
            .map_err(call_failure)?;
        serde_json::to_value(&result).map_err(|err| CallFailure::message(err.to_string()))
    }
}

fn call_failure(err: ServiceError) -> CallFailure {
    let detail = match &err {
        ServiceError::McpError(data) => serde_json::to_value(data).ok(),
        _ => None,
    };
    match detail {
        Some(detail) => CallFailure::structured(err.to_string(), detail),
        None => CallFailure::message(err.to_string()),
    }
}
