use image::{imageops, RgbImage};
use ndarray::Array4;

use crate::error::CodecError;
use crate::frame::{Frame, PixelFormat};

/// Detector input edge length. The model expects a square 640x640 tensor.
pub const INF_SIZE: u32 = 640;

/// Converts a raw decoded frame into the model's input layout:
/// resize to `size` x `size`, scale to [0,1], HWC -> CHW, leading batch dim.
///
/// Pure per-frame transform; the original frame is never touched.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    size: u32,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self { size: INF_SIZE }
    }
}

impl FrameCodec {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn encode(&self, frame: &Frame) -> Result<Array4<f32>, CodecError> {
        let rgb = self.to_rgb(frame)?;

        // Resize to the exact model edge; aspect ratio is intentionally not
        // preserved (no letterboxing), matching the stream's telemetry
        // consumers which un-normalize against the full frame.
        let resized = imageops::resize(&rgb, self.size, self.size, imageops::FilterType::Triangle);

        let size = self.size as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let x = x as usize;
            let y = y as usize;
            let [r, g, b] = pixel.0;
            tensor[[0, 0, y, x]] = (r as f32) / 255.0;
            tensor[[0, 1, y, x]] = (g as f32) / 255.0;
            tensor[[0, 2, y, x]] = (b as f32) / 255.0;
        }

        Ok(tensor)
    }

    fn to_rgb(&self, frame: &Frame) -> Result<RgbImage, CodecError> {
        let invalid = || CodecError::InvalidDimensions {
            width: frame.width(),
            height: frame.height(),
            format: frame.format(),
        };

        match frame.format() {
            PixelFormat::Rgb8 => {
                RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
                    .ok_or_else(invalid)
            }
            PixelFormat::Rgba8 => {
                let expected = frame.width() as usize * frame.height() as usize * 4;
                if frame.data().len() != expected {
                    return Err(invalid());
                }
                let rgb: Vec<u8> = frame
                    .data()
                    .chunks_exact(4)
                    .flat_map(|p| [p[0], p[1], p[2]])
                    .collect();
                RgbImage::from_raw(frame.width(), frame.height(), rgb).ok_or_else(invalid)
            }
            PixelFormat::Bgr8 => {
                let expected = frame.width() as usize * frame.height() as usize * 3;
                if frame.data().len() != expected {
                    return Err(invalid());
                }
                let rgb: Vec<u8> = frame
                    .data()
                    .chunks_exact(3)
                    .flat_map(|p| [p[2], p[1], p[0]])
                    .collect();
                RgbImage::from_raw(frame.width(), frame.height(), rgb).ok_or_else(invalid)
            }
            other => Err(CodecError::UnsupportedFormat(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(format: PixelFormat, pixel: &[u8]) -> Frame {
        let mut data = Vec::new();
        for _ in 0..16 {
            data.extend_from_slice(pixel);
        }
        Frame::new(4, 4, format, data)
    }

    #[test]
    fn encode_shape_and_range() {
        let codec = FrameCodec::default();
        let tensor = codec
            .encode(&solid_frame(PixelFormat::Rgb8, &[255, 0, 0]))
            .unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        // Solid red stays solid red through the resize.
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 1, 320, 320]].abs() < 1e-6);
        assert!(tensor[[0, 2, 639, 639]].abs() < 1e-6);
    }

    #[test]
    fn bgr_channels_are_reordered() {
        let codec = FrameCodec::new(8);
        let tensor = codec
            .encode(&solid_frame(PixelFormat::Bgr8, &[255, 0, 0]))
            .unwrap();
        // BGR (255,0,0) is pure blue.
        assert!(tensor[[0, 0, 0, 0]].abs() < 1e-6);
        assert!((tensor[[0, 2, 0, 0]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rgba_alpha_is_dropped() {
        let codec = FrameCodec::new(8);
        let tensor = codec
            .encode(&solid_frame(PixelFormat::Rgba8, &[0, 255, 0, 7]))
            .unwrap();
        assert!((tensor[[0, 1, 3, 3]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 0, 3, 3]].abs() < 1e-6);
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let codec = FrameCodec::default();
        let frame = Frame::new(4, 4, PixelFormat::Yuv420, vec![0; 24]);
        assert!(matches!(
            codec.encode(&frame),
            Err(CodecError::UnsupportedFormat(PixelFormat::Yuv420))
        ));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let codec = FrameCodec::default();
        let frame = Frame::new(4, 4, PixelFormat::Rgb8, vec![0; 10]);
        assert!(matches!(
            codec.encode(&frame),
            Err(CodecError::InvalidDimensions { .. })
        ));
    }
}
