#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use mcp_remote_inspector::{
    app::{
        inspector_service::InspectorService,
        protocol::{Connector, ProtocolSession, SessionHandle},
        registry::SessionRegistry,
    },
    domain::transport::TransportBinding,
    shared::{
        errors::{CallFailure, ConnectError, DiscoveryError},
        types::{CallRequest, TransportKind},
    },
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Notify;

pub const SSE_URL: &str = "http://sse.test/sse";
pub const HTTP_URL: &str = "http://http.test/mcp";

#[derive(Debug, Clone)]
pub enum ConnectScript {
    Accept,
    Timeout,
    Reject(String),
}

/// Scripted stand-in for a remote server reachable over one transport kind.
pub struct ScriptedServer {
    pub connect: Mutex<ConnectScript>,
    pub list_response: Mutex<Result<Value, String>>,
    pub call_response: Mutex<Result<Value, (String, Option<Value>)>>,
    pub connect_gate: Mutex<Option<Arc<Notify>>>,
    pub call_gate: Mutex<Option<Arc<Notify>>>,
    pub last_request: Mutex<Option<CallRequest>>,
    pub connects: AtomicUsize,
    pub lists: AtomicUsize,
    pub calls: AtomicUsize,
}

impl ScriptedServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connect: Mutex::new(ConnectScript::Accept),
            list_response: Mutex::new(Ok(sample_catalog())),
            call_response: Mutex::new(Ok(text_result("{\"ok\":true}"))),
            connect_gate: Mutex::new(None),
            call_gate: Mutex::new(None),
            last_request: Mutex::new(None),
            connects: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn hold_connect(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.connect_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn hold_calls(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.call_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn sample_catalog() -> Value {
    json!({
        "tools": [
            {
                "name": "read_wiki",
                "description": "Read a wiki page",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "repoName": { "type": "string", "description": "owner/repo" },
                        "page": { "type": "string" }
                    },
                    "required": ["repoName"]
                }
            },
            {
                "name": "ask",
                "inputSchema": { "type": "object", "properties": { "question": {} } }
            },
            { "name": "ping" }
        ]
    })
}

pub fn text_result(text: &str) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

pub struct FakeConnector {
    sse: Arc<ScriptedServer>,
    streamable_http: Arc<ScriptedServer>,
}

impl FakeConnector {
    fn server(&self, kind: TransportKind) -> Arc<ScriptedServer> {
        match kind {
            TransportKind::Sse => self.sse.clone(),
            TransportKind::StreamableHttp => self.streamable_http.clone(),
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        binding: TransportBinding,
        timeout: Duration,
    ) -> Result<SessionHandle, ConnectError> {
        let server = self.server(binding.kind);
        server.connects.fetch_add(1, Ordering::SeqCst);
        let gate = server.connect_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let script = server.connect.lock().clone();
        match script {
            ConnectScript::Accept => Ok(Arc::new(FakeSession { server })),
            ConnectScript::Timeout => Err(ConnectError::Timeout {
                timeout_ms: timeout.as_millis(),
            }),
            ConnectScript::Reject(message) => Err(ConnectError::Rejected(message)),
        }
    }
}

struct FakeSession {
    server: Arc<ScriptedServer>,
}

#[async_trait]
impl ProtocolSession for FakeSession {
    async fn list_tools(&self) -> Result<Value, DiscoveryError> {
        self.server.lists.fetch_add(1, Ordering::SeqCst);
        self.server.list_response.lock().clone().map_err(DiscoveryError)
    }

    async fn call_tool(&self, request: CallRequest) -> Result<Value, CallFailure> {
        self.server.calls.fetch_add(1, Ordering::SeqCst);
        *self.server.last_request.lock() = Some(request);
        let gate = self.server.call_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let response = self.server.call_response.lock().clone();
        response.map_err(|(message, detail)| CallFailure { message, detail })
    }
}

pub struct Harness {
    pub service: InspectorService,
    pub sse: Arc<ScriptedServer>,
    pub http: Arc<ScriptedServer>,
}

pub fn harness() -> Harness {
    harness_with_urls(SSE_URL, HTTP_URL)
}

pub fn harness_with_urls(sse_url: &str, http_url: &str) -> Harness {
    let sse = ScriptedServer::new();
    let http = ScriptedServer::new();
    let connector = FakeConnector {
        sse: sse.clone(),
        streamable_http: http.clone(),
    };
    let service = InspectorService::new(
        Arc::new(connector),
        SessionRegistry::new(sse_url, http_url),
    );
    Harness { service, sse, http }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached in time");
}
