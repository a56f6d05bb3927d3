use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::decoder::Detection;

/// Best-effort telemetry transport running alongside the media stream.
/// No acknowledgment, no backpressure.
pub trait SideChannel: Send + Sync {
    fn is_open(&self) -> bool;
    fn send(&self, payload: &[u8]) -> anyhow::Result<()>;
}

/// Shared slot for the side channel. The channel is negotiated after the
/// media session is up, so the slot starts empty (treated as closed) and the
/// transport layer attaches the channel once it opens.
#[derive(Clone, Default)]
pub struct SideChannelCell {
    inner: Arc<RwLock<Option<Arc<dyn SideChannel>>>>,
}

impl SideChannelCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, channel: Arc<dyn SideChannel>) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = Some(channel);
        }
    }

    pub fn detach(&self) {
        if let Ok(mut slot) = self.inner.write() {
            *slot = None;
        }
    }

    fn get(&self) -> Option<Arc<dyn SideChannel>> {
        // A poisoned lock is treated as a closed channel.
        self.inner.read().ok().and_then(|slot| slot.clone())
    }
}

/// One processed frame's telemetry. Timestamps are integer milliseconds
/// since the Unix epoch: `capture_ts` when processing began, `recv_ts` when
/// the model input was ready, `inference_ts` when the boxes were decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameResult {
    pub frame_id: String,
    pub capture_ts: i64,
    pub recv_ts: i64,
    pub inference_ts: i64,
    pub detections: Vec<Detection>,
}

impl FrameResult {
    /// Builds a result with a fresh unique frame id.
    pub fn new(capture_ts: i64, recv_ts: i64, inference_ts: i64, detections: Vec<Detection>) -> Self {
        Self {
            frame_id: Uuid::new_v4().to_string(),
            capture_ts,
            recv_ts,
            inference_ts,
            detections,
        }
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Serializes results and hands them to the side channel when it is open;
/// otherwise drops them silently. Send faults never escalate.
#[derive(Clone)]
pub struct ResultEmitter {
    channel: SideChannelCell,
}

impl ResultEmitter {
    pub fn new(channel: SideChannelCell) -> Self {
        Self { channel }
    }

    pub fn emit(&self, result: &FrameResult) {
        let Some(channel) = self.channel.get() else {
            return;
        };
        // The channel may have closed while inference was running.
        if !channel.is_open() {
            return;
        }
        match serde_json::to_vec(result) {
            Ok(payload) => {
                if let Err(err) = channel.send(&payload) {
                    debug!(error = %err, frame_id = %result.frame_id, "side channel send failed");
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to serialize frame result");
            }
        }
    }
}
