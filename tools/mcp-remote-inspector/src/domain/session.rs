use serde::Serialize;

use crate::{
    domain::catalog::{CatalogCheck, ToolDescriptor, parameter_template},
    shared::types::{ParameterValues, TransportKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyFlag {
    Connecting,
    ListLoading,
    CallInProgress,
}

impl BusyFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusyFlag::Connecting => "connecting",
            BusyFlag::ListLoading => "list_loading",
            BusyFlag::CallInProgress => "call_in_progress",
        }
    }
}

/// Complete state of one transport kind. `H` is the live connection handle.
#[derive(Debug)]
pub struct Session<H> {
    kind: TransportKind,
    pub server_url: String,
    pub candidate_url: String,
    connection: Option<H>,
    pub connecting: bool,
    pub connected: bool,
    pub tools: Vec<ToolDescriptor>,
    pub selected_tool: Option<usize>,
    pub parameter_values: ParameterValues,
    pub last_result: String,
    pub list_loading: bool,
    pub call_in_progress: bool,
    epoch: u64,
}

impl<H: Clone> Session<H> {
    pub fn new(kind: TransportKind, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        Self {
            kind,
            candidate_url: server_url.clone(),
            server_url,
            connection: None,
            connecting: false,
            connected: false,
            tools: Vec::new(),
            selected_tool: None,
            parameter_values: ParameterValues::new(),
            last_result: String::new(),
            list_loading: false,
            call_in_progress: false,
            epoch: 0,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn connection(&self) -> Option<H> {
        self.connection.clone()
    }

    pub fn is_busy(&self, flag: BusyFlag) -> bool {
        match flag {
            BusyFlag::Connecting => self.connecting,
            BusyFlag::ListLoading => self.list_loading,
            BusyFlag::CallInProgress => self.call_in_progress,
        }
    }

    pub fn set_busy(&mut self, flag: BusyFlag, busy: bool) {
        match flag {
            BusyFlag::Connecting => self.connecting = busy,
            BusyFlag::ListLoading => self.list_loading = busy,
            BusyFlag::CallInProgress => self.call_in_progress = busy,
        }
    }

    /// Clean slate for a new connect attempt. Returns the previous handle so the
    /// caller can release it outside any lock.
    pub fn begin_connect(&mut self) -> Option<H> {
        self.epoch += 1;
        self.connecting = true;
        self.connected = false;
        self.tools.clear();
        self.selected_tool = None;
        self.parameter_values.clear();
        self.last_result.clear();
        self.connection.take()
    }

    pub fn attach_connection(&mut self, handle: H) {
        self.connection = Some(handle);
        self.connected = true;
    }

    pub fn apply_catalog(&mut self, check: CatalogCheck) {
        match check {
            CatalogCheck::Valid(tools) if !tools.is_empty() => {
                self.parameter_values = parameter_template(&tools[0]);
                self.tools = tools;
                self.selected_tool = Some(0);
            }
            CatalogCheck::Valid(_) | CatalogCheck::Rejected(_) => {
                self.tools.clear();
                self.selected_tool = None;
                self.parameter_values.clear();
            }
        }
    }

    /// Any prior edits are discarded; an index with no tool leaves no parameters.
    pub fn select_tool(&mut self, index: Option<usize>) {
        self.selected_tool = index;
        self.parameter_values = self
            .selected_descriptor()
            .map(parameter_template)
            .unwrap_or_default();
    }

    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameter_values.insert(key.into(), value.into());
    }

    pub fn selected_descriptor(&self) -> Option<&ToolDescriptor> {
        self.selected_tool.and_then(|index| self.tools.get(index))
    }

    pub fn apply_candidate_url(&mut self) {
        if !self.candidate_url.trim().is_empty() {
            self.server_url = self.candidate_url.trim().to_string();
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            kind: self.kind,
            server_url: self.server_url.clone(),
            candidate_url: self.candidate_url.clone(),
            has_connection: self.connection.is_some(),
            connecting: self.connecting,
            connected: self.connected,
            tools: self.tools.clone(),
            selected_tool: self.selected_tool,
            parameter_values: self.parameter_values.clone(),
            last_result: self.last_result.clone(),
            list_loading: self.list_loading,
            call_in_progress: self.call_in_progress,
        }
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub kind: TransportKind,
    pub server_url: String,
    pub candidate_url: String,
    pub has_connection: bool,
    pub connecting: bool,
    pub connected: bool,
    pub tools: Vec<ToolDescriptor>,
    pub selected_tool: Option<usize>,
    pub parameter_values: ParameterValues,
    pub last_result: String,
    pub list_loading: bool,
    pub call_in_progress: bool,
}

impl SessionSnapshot {
    pub fn status_label(&self) -> &'static str {
        if self.connected {
            "Connected"
        } else {
            "Not connected"
        }
    }

    pub fn selected_descriptor(&self) -> Option<&ToolDescriptor> {
        self.selected_tool.and_then(|index| self.tools.get(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::validate_catalog;
    use serde_json::json;

    fn catalog() -> CatalogCheck {
        validate_catalog(&json!([
            { "name": "first", "inputSchema": { "properties": { "a": {}, "b": {} } } },
            { "name": "second", "inputSchema": { "properties": { "x": {} } } },
            { "name": "bare" }
        ]))
    }

    fn session() -> Session<u8> {
        Session::new(TransportKind::Sse, "https://example.com/sse")
    }

    #[test]
    fn new_session_starts_empty() {
        let s = session();
        assert_eq!(s.server_url, "https://example.com/sse");
        assert_eq!(s.candidate_url, s.server_url);
        assert!(s.connection().is_none());
        assert_eq!(s.selected_tool, None);
        assert!(s.snapshot().last_result.is_empty());
    }

    #[test]
    fn catalog_selects_first_tool() {
        let mut s = session();
        s.apply_catalog(catalog());
        assert_eq!(s.selected_tool, Some(0));
        let keys: Vec<&str> = s.parameter_values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn rejected_catalog_clears_everything() {
        let mut s = session();
        s.apply_catalog(catalog());
        s.apply_catalog(validate_catalog(&json!([{ "description": "x" }])));
        assert!(s.tools.is_empty());
        assert_eq!(s.selected_tool, None);
        assert!(s.parameter_values.is_empty());
    }

    #[test]
    fn selecting_discards_edits() {
        let mut s = session();
        s.apply_catalog(catalog());
        s.set_parameter("a", "edited");
        s.select_tool(Some(1));
        assert_eq!(s.parameter_values.len(), 1);
        assert_eq!(s.parameter_values.get("x").map(String::as_str), Some(""));
        s.select_tool(Some(2));
        assert!(s.parameter_values.is_empty());
        s.select_tool(Some(42));
        assert_eq!(s.selected_tool, Some(42));
        assert!(s.parameter_values.is_empty());
    }

    #[test]
    fn set_parameter_merges_single_key() {
        let mut s = session();
        s.apply_catalog(catalog());
        s.set_parameter("b", "2");
        s.set_parameter("extra", "3");
        assert_eq!(s.parameter_values.get("a").map(String::as_str), Some(""));
        assert_eq!(s.parameter_values.get("b").map(String::as_str), Some("2"));
        assert_eq!(s.parameter_values.get("extra").map(String::as_str), Some("3"));
    }

    #[test]
    fn begin_connect_resets_and_hands_back_old_handle() {
        let mut s = session();
        s.attach_connection(7);
        s.apply_catalog(catalog());
        s.last_result = "old".into();
        let before = s.epoch();
        let old = s.begin_connect();
        assert_eq!(old, Some(7));
        assert!(s.connecting);
        assert!(!s.connected);
        assert!(s.tools.is_empty());
        assert_eq!(s.selected_tool, None);
        assert!(s.parameter_values.is_empty());
        assert!(s.last_result.is_empty());
        assert!(s.connection().is_none());
        assert_eq!(s.epoch(), before + 1);
    }

    #[test]
    fn candidate_url_applies_only_when_set() {
        let mut s = session();
        s.candidate_url = "   ".into();
        s.apply_candidate_url();
        assert_eq!(s.server_url, "https://example.com/sse");
        s.candidate_url = "http://localhost:9100/sse".into();
        s.apply_candidate_url();
        assert_eq!(s.server_url, "http://localhost:9100/sse");
    }
}
