//! Capability ports onto the wire protocol client.
//!
//! The core never frames or encodes messages itself; it hands a validated
//! [`TransportBinding`] to a [`Connector`] and talks to the returned
//! [`ProtocolSession`] in decoded JSON.

use async_trait::async_trait;
use serde_json::Value;
use std::{sync::Arc, time::Duration};

use crate::{
    domain::transport::TransportBinding,
    shared::{
        errors::{CallFailure, ConnectError, DiscoveryError},
        types::CallRequest,
    },
};

pub type SessionHandle = Arc<dyn ProtocolSession>;

#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens the connection and completes the handshake within `timeout`.
    async fn connect(
        &self,
        binding: TransportBinding,
        timeout: Duration,
    ) -> Result<SessionHandle, ConnectError>;
}

#[async_trait]
pub trait ProtocolSession: Send + Sync {
    /// Raw discovery response, expected to carry a `tools` field.
    async fn list_tools(&self) -> Result<Value, DiscoveryError>;

    /// Raw invocation response, expected to carry a `content` sequence.
    async fn call_tool(&self, request: CallRequest) -> Result<Value, CallFailure>;
}
