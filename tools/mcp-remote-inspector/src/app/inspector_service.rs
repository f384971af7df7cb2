use parking_lot::Mutex;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

use crate::{
    app::{
        protocol::Connector,
        registry::{BusyGuard, SessionRegistry},
    },
    domain::{
        catalog::{CatalogCheck, CatalogRejection, ParameterField, parameter_fields, validate_catalog},
        invocation::{DisplayText, NO_TOOL_SELECTED, normalize_result, render_failure},
        session::{BusyFlag, SessionSnapshot},
        transport::TransportBinding,
    },
    infra::metrics::{self, PendingGaugeGuard},
    shared::{
        types::{CallRequest, TransportKind},
        utils::measure_latency,
    },
};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// `server_url` was empty; nothing changed.
    MissingUrl,
    Busy,
    InvalidUrl(String),
    Failed(String),
    Connected { latency_ms: u64, catalog: ListOutcome },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    NotConnected,
    Busy,
    /// The discovery call failed; the previous catalog was kept.
    Failed(String),
    Loaded { count: usize },
    Rejected(CatalogRejection),
    /// A newer connect began while discovery was in flight.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Busy,
    NoToolSelected,
    Completed(DisplayText),
    Failed(DisplayText),
    /// Settled after a newer connect began; not written to the session.
    Stale(DisplayText),
}

impl ConnectOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectOutcome::MissingUrl => "missing_url",
            ConnectOutcome::Busy => "busy",
            ConnectOutcome::InvalidUrl(_) => "invalid_url",
            ConnectOutcome::Failed(_) => "failed",
            ConnectOutcome::Connected { .. } => "connected",
        }
    }
}

impl ListOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListOutcome::NotConnected => "not_connected",
            ListOutcome::Busy => "busy",
            ListOutcome::Failed(_) => "failed",
            ListOutcome::Loaded { .. } => "loaded",
            ListOutcome::Rejected(_) => "rejected",
            ListOutcome::Stale => "stale",
        }
    }
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Busy => "busy",
            CallOutcome::NoToolSelected => "no_tool_selected",
            CallOutcome::Completed(_) => "completed",
            CallOutcome::Failed(_) => "failed",
            CallOutcome::Stale(_) => "stale",
        }
    }
}

/// Session and invocation state machine over both transport kinds.
///
/// Cloning is cheap and every clone drives the same sessions, so operations on
/// different kinds can be spawned concurrently.
#[derive(Clone)]
pub struct InspectorService {
    connector: Arc<dyn Connector>,
    registry: Arc<SessionRegistry>,
    active: Arc<Mutex<TransportKind>>,
    connect_timeout: Duration,
}

impl InspectorService {
    pub fn new(connector: Arc<dyn Connector>, registry: SessionRegistry) -> Self {
        Self {
            connector,
            registry: Arc::new(registry),
            active: Arc::new(Mutex::new(TransportKind::default())),
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn active_transport(&self) -> TransportKind {
        *self.active.lock()
    }

    /// Pure selector; neither session is touched.
    pub fn switch_transport(&self, kind: TransportKind) {
        *self.active.lock() = kind;
    }

    pub fn snapshot(&self, kind: TransportKind) -> SessionSnapshot {
        self.registry.snapshot(kind)
    }

    pub fn set_candidate_url(&self, kind: TransportKind, url: impl Into<String>) {
        self.registry.session(kind).lock().candidate_url = url.into();
    }

    pub fn apply_candidate_url(&self, kind: TransportKind) {
        self.registry.session(kind).lock().apply_candidate_url();
    }

    /// Prometheus text exposition of every recorded operation.
    pub fn metrics_report(&self) -> anyhow::Result<String> {
        metrics::render()
    }

    pub async fn connect(&self, kind: TransportKind) -> ConnectOutcome {
        let outcome = self.connect_inner(kind).await;
        metrics::record_outcome("connect", kind, outcome.as_str());
        outcome
    }

    async fn connect_inner(&self, kind: TransportKind) -> ConnectOutcome {
        let (url, _guard, previous) = {
            let mut session = self.registry.session(kind).lock();
            if session.server_url.is_empty() {
                return ConnectOutcome::MissingUrl;
            }
            let Some(guard) =
                BusyGuard::acquire(&self.registry, &mut session, BusyFlag::Connecting)
            else {
                return ConnectOutcome::Busy;
            };
            let previous = session.begin_connect();
            (session.server_url.clone(), guard, previous)
        };
        if previous.is_some() {
            debug!(transport = %kind, "releasing previous connection");
            drop(previous);
        }

        let binding = match TransportBinding::parse(kind, &url) {
            Ok(binding) => binding,
            Err(err) => {
                warn!(transport = %kind, %url, %err, "invalid server url");
                self.registry.session(kind).lock().connected = false;
                return ConnectOutcome::InvalidUrl(err.to_string());
            }
        };

        let _pending = PendingGaugeGuard::new();
        let (result, latency_ms) =
            measure_latency(|| self.connector.connect(binding, self.connect_timeout)).await;
        metrics::observe_latency("connect", latency_ms);
        match result {
            Ok(handle) => {
                self.registry
                    .session(kind)
                    .lock()
                    .attach_connection(handle);
                info!(transport = %kind, %url, latency_ms, "connected");
                let catalog = self.list_tools(kind).await;
                ConnectOutcome::Connected {
                    latency_ms,
                    catalog,
                }
            }
            Err(err) => {
                warn!(transport = %kind, %url, %err, "connect failed");
                self.registry.session(kind).lock().connected = false;
                ConnectOutcome::Failed(err.to_string())
            }
        }
    }

    pub async fn list_tools(&self, kind: TransportKind) -> ListOutcome {
        let outcome = self.list_tools_inner(kind).await;
        metrics::record_outcome("list_tools", kind, outcome.as_str());
        outcome
    }

    async fn list_tools_inner(&self, kind: TransportKind) -> ListOutcome {
        let (handle, epoch, _guard) = {
            let mut session = self.registry.session(kind).lock();
            let Some(handle) = session.connection() else {
                return ListOutcome::NotConnected;
            };
            let Some(guard) =
                BusyGuard::acquire(&self.registry, &mut session, BusyFlag::ListLoading)
            else {
                return ListOutcome::Busy;
            };
            (handle, session.epoch(), guard)
        };

        let _pending = PendingGaugeGuard::new();
        let (result, latency_ms) = measure_latency(|| handle.list_tools()).await;
        metrics::observe_latency("list_tools", latency_ms);
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(transport = %kind, %err, "tool discovery failed; keeping catalog");
                return ListOutcome::Failed(err.to_string());
            }
        };

        let tools = match response.get("tools") {
            None | Some(Value::Null) => Value::Array(Vec::new()),
            Some(tools) => tools.clone(),
        };
        let check = validate_catalog(&tools);
        let outcome = match &check {
            CatalogCheck::Valid(tools) => ListOutcome::Loaded { count: tools.len() },
            CatalogCheck::Rejected(reason) => {
                warn!(transport = %kind, %reason, "discarding malformed catalog");
                ListOutcome::Rejected(reason.clone())
            }
        };

        let mut session = self.registry.session(kind).lock();
        if session.epoch() != epoch {
            debug!(transport = %kind, "catalog arrived after reconnect; dropped");
            return ListOutcome::Stale;
        }
        session.apply_catalog(check);
        debug!(transport = %kind, latency_ms, tools = session.tools.len(), "catalog refreshed");
        outcome
    }

    pub fn select_tool(&self, kind: TransportKind, index: Option<usize>) {
        self.registry.session(kind).lock().select_tool(index);
    }

    pub fn set_parameter(&self, kind: TransportKind, key: impl Into<String>, value: impl Into<String>) {
        self.registry
            .session(kind)
            .lock()
            .set_parameter(key, value);
    }

    pub fn parameter_fields(&self, kind: TransportKind) -> Vec<ParameterField> {
        let session = self.registry.session(kind).lock();
        session
            .selected_descriptor()
            .map(|tool| parameter_fields(tool, &session.parameter_values))
            .unwrap_or_default()
    }

    pub async fn call_tool(&self, kind: TransportKind) -> CallOutcome {
        let outcome = self.call_tool_inner(kind).await;
        metrics::record_outcome("call_tool", kind, outcome.as_str());
        outcome
    }

    async fn call_tool_inner(&self, kind: TransportKind) -> CallOutcome {
        let (handle, request, epoch, _guard) = {
            let mut session = self.registry.session(kind).lock();
            if session.is_busy(BusyFlag::CallInProgress) {
                return CallOutcome::Busy;
            }
            let target = session
                .connection()
                .zip(session.selected_descriptor().map(|tool| tool.name.clone()));
            let Some((handle, name)) = target else {
                session.last_result = NO_TOOL_SELECTED.to_string();
                return CallOutcome::NoToolSelected;
            };
            let request = CallRequest {
                name,
                arguments: session.parameter_values.clone(),
            };
            let Some(guard) =
                BusyGuard::acquire(&self.registry, &mut session, BusyFlag::CallInProgress)
            else {
                return CallOutcome::Busy;
            };
            (handle, request, session.epoch(), guard)
        };

        let tool = request.name.clone();
        let _pending = PendingGaugeGuard::new();
        let (result, latency_ms) = measure_latency(|| handle.call_tool(request)).await;
        metrics::observe_latency("call_tool", latency_ms);
        let (display, succeeded) = match result {
            Ok(response) => (normalize_result(&response), true),
            Err(failure) => {
                warn!(transport = %kind, %tool, err = %failure, "tool call failed");
                (render_failure(&failure), false)
            }
        };

        let mut session = self.registry.session(kind).lock();
        if session.epoch() != epoch {
            debug!(transport = %kind, %tool, "call settled after reconnect; dropped");
            return CallOutcome::Stale(display);
        }
        session.last_result = display.as_str().to_string();
        info!(transport = %kind, %tool, latency_ms, succeeded, "tool call settled");
        if succeeded {
            CallOutcome::Completed(display)
        } else {
            CallOutcome::Failed(display)
        }
    }
}
