use std::sync::Arc;

/// Pixel layout of a decoded frame as delivered by the transport track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Packed 8-bit RGB, 3 bytes per pixel.
    Rgb8,
    /// Packed 8-bit RGBA, 4 bytes per pixel. Alpha is discarded on encode.
    Rgba8,
    /// Packed 8-bit BGR, 3 bytes per pixel (the original stream format).
    Bgr8,
    /// Planar YUV 4:2:0. Delivered by some decoders but not consumed by the
    /// frame codec; admitting such a frame fails that attempt only.
    Yuv420,
}

/// One decoded image from the live video stream.
///
/// The pixel buffer is shared behind an `Arc`, so cloning a frame for the
/// inference worker never copies pixels and the frame forwarded to the
/// outbound track is byte-identical to the one received.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl Frame {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            format,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// True when `other` shares this frame's pixel buffer.
    pub fn shares_buffer(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_pixels() {
        let frame = Frame::new(2, 1, PixelFormat::Rgb8, vec![1, 2, 3, 4, 5, 6]);
        let copy = frame.clone();
        assert!(frame.shares_buffer(&copy));
        assert_eq!(copy.data(), frame.data());
    }
}
