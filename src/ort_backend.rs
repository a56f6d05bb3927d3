use anyhow::{Context, Result};
use ndarray::{Array4, ArrayD};
use ort::{CUDAExecutionProvider, GraphOptimizationLevel, Session, TensorRTExecutionProvider};
use tracing::info;

use crate::model::ModelRunner;

/// Execution provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtEP {
    Cpu,
    Cuda(i32),
    Trt(i32),
}

#[derive(Debug, Clone)]
pub struct OrtConfig {
    pub model_path: String,
    pub ep: OrtEP,
}

/// ONNX Runtime session wrapper. Input and output names are resolved from
/// the model metadata at build time, so the backend is not tied to one
/// export's tensor naming.
pub struct OrtBackend {
    session: Session,
    ep: OrtEP,
    input_name: String,
    output_name: String,
}

impl OrtBackend {
    pub fn build(config: OrtConfig) -> Result<Self> {
        let builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?;
        let builder = match config.ep {
            OrtEP::Cuda(device_id) => builder.with_execution_providers([
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])?,
            OrtEP::Trt(device_id) => builder.with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])?,
            OrtEP::Cpu => builder,
        };

        let session = builder
            .commit_from_file(&config.model_path)
            .with_context(|| format!("failed to load ONNX model {}", config.model_path))?;

        let input_name = session
            .inputs
            .first()
            .context("model has no inputs")?
            .name
            .clone();
        let output_name = session
            .outputs
            .first()
            .context("model has no outputs")?
            .name
            .clone();

        info!(
            model = %config.model_path,
            ep = ?config.ep,
            input = %input_name,
            output = %output_name,
            "detector session ready"
        );

        Ok(Self {
            session,
            ep: config.ep,
            input_name,
            output_name,
        })
    }

    pub fn ep(&self) -> OrtEP {
        self.ep
    }
}

impl ModelRunner for OrtBackend {
    fn run(&mut self, input: Array4<f32>) -> Result<ArrayD<f32>> {
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input.view()]?)
            .context("detector inference failed")?;
        let raw = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .context("failed to extract detector output")?
            .view()
            .into_owned();
        Ok(raw)
    }
}
