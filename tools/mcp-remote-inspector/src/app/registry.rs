use parking_lot::Mutex;
use std::sync::Arc;

use crate::{
    app::protocol::SessionHandle,
    domain::session::{BusyFlag, Session, SessionSnapshot},
    shared::types::TransportKind,
};

pub type TransportSession = Session<SessionHandle>;

/// One independent session per transport kind, each behind its own lock.
pub struct SessionRegistry {
    sse: Mutex<TransportSession>,
    streamable_http: Mutex<TransportSession>,
}

impl SessionRegistry {
    pub fn new(sse_url: impl Into<String>, streamable_http_url: impl Into<String>) -> Self {
        Self {
            sse: Mutex::new(Session::new(TransportKind::Sse, sse_url)),
            streamable_http: Mutex::new(Session::new(
                TransportKind::StreamableHttp,
                streamable_http_url,
            )),
        }
    }

    pub fn session(&self, kind: TransportKind) -> &Mutex<TransportSession> {
        match kind {
            TransportKind::Sse => &self.sse,
            TransportKind::StreamableHttp => &self.streamable_http,
        }
    }

    pub fn snapshot(&self, kind: TransportKind) -> SessionSnapshot {
        self.session(kind).lock().snapshot()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(
            TransportKind::Sse.default_url(),
            TransportKind::StreamableHttp.default_url(),
        )
    }
}

/// Clears a busy flag when dropped, so the flag settles exactly once even if the
/// owning future is dropped mid-flight.
pub struct BusyGuard {
    registry: Arc<SessionRegistry>,
    kind: TransportKind,
    flag: BusyFlag,
}

impl BusyGuard {
    /// Sets `flag` unless it is already set. Must be called with the session lock held
    /// by the caller through `session`.
    pub fn acquire(
        registry: &Arc<SessionRegistry>,
        session: &mut TransportSession,
        flag: BusyFlag,
    ) -> Option<Self> {
        if session.is_busy(flag) {
            return None;
        }
        session.set_busy(flag, true);
        Some(Self {
            registry: Arc::clone(registry),
            kind: session.kind(),
            flag,
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.registry
            .session(self.kind)
            .lock()
            .set_busy(self.flag, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_uses_default_urls() {
        let registry = SessionRegistry::default();
        assert_eq!(
            registry.snapshot(TransportKind::Sse).server_url,
            "https://mcp.deepwiki.com/sse"
        );
        assert_eq!(
            registry.snapshot(TransportKind::StreamableHttp).server_url,
            "https://mcp.context7.com/mcp"
        );
    }

    #[test]
    fn guard_sets_and_releases_flag() {
        let registry = Arc::new(SessionRegistry::default());
        let guard = {
            let mut session = registry.session(TransportKind::Sse).lock();
            BusyGuard::acquire(&registry, &mut session, BusyFlag::ListLoading)
        };
        assert!(guard.is_some());
        assert!(registry.snapshot(TransportKind::Sse).list_loading);
        {
            let mut session = registry.session(TransportKind::Sse).lock();
            assert!(BusyGuard::acquire(&registry, &mut session, BusyFlag::ListLoading).is_none());
        }
        drop(guard);
        assert!(!registry.snapshot(TransportKind::Sse).list_loading);
        assert!(!registry.snapshot(TransportKind::StreamableHttp).list_loading);
    }
}
