use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::emitter::SideChannelCell;

/// Session negotiation document exchanged with the remote peer. Opaque to
/// the pipeline; the transport collaborator interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: String,
    pub sdp: String,
}

/// One live media session: an id plus the side-channel slot the transport
/// fills in once the telemetry channel opens.
#[derive(Clone)]
pub struct StreamSession {
    id: Uuid,
    side_channel: SideChannelCell,
}

impl StreamSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            side_channel: SideChannelCell::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn side_channel(&self) -> &SideChannelCell {
        &self.side_channel
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide set of active sessions, owned by the session-management
/// collaborator. Exists for bulk teardown; the inference pipeline never
/// touches it.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, StreamSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, session: StreamSession) -> Uuid {
        let id = session.id();
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(id, session);
        }
        id
    }

    pub fn remove(&self, id: Uuid) -> Option<StreamSession> {
        self.sessions.lock().ok()?.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tears down every session: detaches each side channel so in-flight
    /// emits degrade to silent drops, then clears the set.
    pub fn shutdown_all(&self) {
        let Ok(mut sessions) = self.sessions.lock() else {
            return;
        };
        let count = sessions.len();
        for session in sessions.values() {
            session.side_channel().detach();
        }
        sessions.clear();
        info!(count, "all sessions shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::SideChannel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingChannel(AtomicUsize);

    impl SideChannel for CountingChannel {
        fn is_open(&self) -> bool {
            true
        }

        fn send(&self, _payload: &[u8]) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn register_and_remove() {
        let registry = SessionRegistry::new();
        let id = registry.register(StreamSession::new());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(id).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn session_description_wire_fields() {
        let desc: SessionDescription =
            serde_json::from_str(r#"{"type":"offer","sdp":"v=0"}"#).unwrap();
        assert_eq!(desc.kind, "offer");
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["type"], "offer");
        assert_eq!(json["sdp"], "v=0");
    }

    #[test]
    fn shutdown_all_detaches_channels() {
        let registry = SessionRegistry::new();
        let session = StreamSession::new();
        let cell = session.side_channel().clone();
        cell.attach(Arc::new(CountingChannel(AtomicUsize::new(0))));
        registry.register(session);
        registry.register(StreamSession::new());

        registry.shutdown_all();
        assert!(registry.is_empty());

        // The cell now reports no channel; an emitter using it goes silent.
        let emitter = crate::emitter::ResultEmitter::new(cell);
        emitter.emit(&crate::emitter::FrameResult::new(0, 0, 0, Vec::new()));
    }
}
