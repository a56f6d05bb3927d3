use clap::Parser;

use crate::codec::INF_SIZE;
use crate::decoder::CONF_THRESHOLD;

/// Runtime configuration for the detection pipeline.
#[derive(Parser, Debug, Clone)]
#[command(name = "sentinel", about = "Live-stream object detection pipeline")]
pub struct Args {
    /// ONNX detection model path
    #[arg(long, default_value = "models/yolov8n.onnx")]
    pub model: String,

    /// Confidence threshold for keeping a detection
    #[arg(long, default_value_t = CONF_THRESHOLD)]
    pub conf: f32,

    /// Model input edge length (square)
    #[arg(long, default_value_t = INF_SIZE)]
    pub size: u32,

    /// Run inference on the CUDA execution provider
    #[arg(long)]
    pub cuda: bool,

    /// Run inference on the TensorRT execution provider
    #[arg(long)]
    pub trt: bool,

    /// GPU device id for CUDA/TensorRT
    #[arg(long, default_value_t = 0)]
    pub device_id: i32,

    /// Images to stream through the pipeline
    #[arg(required = true)]
    pub source: Vec<String>,
}
