use crate::frame::PixelFormat;

/// Frame codec faults. Fatal for the affected frame attempt only.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("unsupported pixel format {0:?}")]
    UnsupportedFormat(PixelFormat),

    #[error("pixel buffer does not match {width}x{height} {format:?}")]
    InvalidDimensions {
        width: u32,
        height: u32,
        format: PixelFormat,
    },
}

/// Detection decoder faults.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected model output shape {got:?}, want [1, {rows}, N]")]
    Shape { got: Vec<usize>, rows: usize },
}

/// Transport-level faults. Fatal to the stream, not to per-frame logic.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The media session ended normally; no more frames will arrive.
    #[error("stream closed")]
    Closed,

    #[error("transport failure: {0}")]
    Failed(String),
}
