pub mod codec; // frame -> model input tensor
pub mod config;
pub mod decoder; // raw model output -> labeled boxes
pub mod emitter; // telemetry over the side channel
pub mod error;
pub mod frame;
pub mod gate; // single-flight admission
pub mod labels;
pub mod model;
pub mod ort_backend;
pub mod pipeline; // per-stream processing loop
pub mod session;

pub use crate::codec::{FrameCodec, INF_SIZE};
pub use crate::config::Args;
pub use crate::decoder::{Detection, DetectionDecoder, CONF_THRESHOLD};
pub use crate::emitter::{FrameResult, ResultEmitter, SideChannel, SideChannelCell};
pub use crate::error::{CodecError, DecodeError, TransportError};
pub use crate::frame::{Frame, PixelFormat};
pub use crate::gate::{InferenceGate, InferencePermit, ProcessingDecision};
pub use crate::model::ModelRunner;
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};
pub use crate::pipeline::{StreamProcessor, VideoSink, VideoSource};
pub use crate::session::{SessionDescription, SessionRegistry, StreamSession};
