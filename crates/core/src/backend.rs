//! ONNX Runtime adapter: an `ort::Session` behind the [`Transform`] trait.
//!
//! Supports FP32 and FP16 models (f16 IO converted at the session
//! boundary via the `half` crate). Device selection is CPU by default;
//! requesting CUDA when the EP is unavailable warns and falls back.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use half::f16;
use half::slice::HalfFloatSliceExt;
use ndarray::{Array3, ArrayD, Axis, Ix4};
use ort::{
    execution_providers::{CUDAExecutionProvider, ExecutionProvider},
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::TransformError;
use crate::model::Transform;
use crate::tensor::CHANNELS;

/// Inference device selection. Default is `Auto`: CUDA when the EP is
/// available, CPU otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Auto,
    Cpu,
    Cuda,
}

impl Device {
    /// Parse from string (case-insensitive). Returns `Auto` for unknown values.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Self::Cpu,
            "cuda" | "gpu" => Self::Cuda,
            _ => Self::Auto,
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda => write!(f, "cuda"),
        }
    }
}

/// Resolve the requested device against actual CUDA EP availability.
/// `Auto` probes; an explicit CUDA request on a machine without the EP
/// warns and falls back to CPU instead of failing.
fn select_device(requested: Device, cuda_available: bool) -> Device {
    match requested {
        Device::Auto => {
            if cuda_available {
                Device::Cuda
            } else {
                Device::Cpu
            }
        }
        Device::Cuda if !cuda_available => {
            warn!("CUDA requested but the EP is not available — falling back to CPU");
            Device::Cpu
        }
        other => other,
    }
}

/// Heuristic classification of runtime failures that indicate memory
/// exhaustion rather than a broken model or bad input.
pub(crate) fn is_memory_exhaustion(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("out of memory")
        || lower.contains("failed to allocate")
        || lower.contains("bad_alloc")
        || lower.contains("cudamalloc")
        || lower.contains("memory exhausted")
}

fn classify(err: ort::Error) -> TransformError {
    let message = err.to_string();
    if is_memory_exhaustion(&message) {
        TransformError::ResourceExhausted(message)
    } else {
        TransformError::Backend(message)
    }
}

/// A fixed 2× super-resolution model loaded through ONNX Runtime.
pub struct OrtTransform {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    is_fp16: bool,
}

impl OrtTransform {
    /// Load a model and detect its IO names and element type from session
    /// metadata.
    pub fn load(model_path: &Path, device: Device) -> Result<Self> {
        let builder =
            Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;

        let cuda_available = CUDAExecutionProvider::default()
            .is_available()
            .unwrap_or(false);
        let resolved = select_device(device, cuda_available);
        info!(device = %resolved, "Using inference device");

        let session = match resolved {
            Device::Cuda => {
                debug!(device = "cuda", "Building session with CUDA EP");
                builder
                    .with_execution_providers([CUDAExecutionProvider::default().build()])?
                    .commit_from_file(model_path)
            }
            _ => {
                debug!(device = "cpu", "Building session");
                builder.commit_from_file(model_path)
            }
        }
        .with_context(|| format!("Failed to load ONNX model: {}", model_path.display()))?;

        let input_name = session.inputs()[0].name().to_string();
        let output_name = session.outputs()[0].name().to_string();
        let is_fp16 = match session.inputs()[0].dtype() {
            ort::value::ValueType::Tensor { ty, .. } => {
                *ty == ort::tensor::TensorElementType::Float16
            }
            _ => false,
        };

        debug!(%input_name, %output_name, is_fp16, "Detected model IO");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            is_fp16,
        })
    }

    fn run_f32(&self, input: ArrayD<f32>) -> Result<ArrayD<f32>, TransformError> {
        let input_tensor = Tensor::from_array(input).map_err(classify)?;
        let mut session = self.session.lock().expect("session lock poisoned");
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => &input_tensor])
            .map_err(classify)?;
        let view = outputs[self.output_name.as_str()]
            .try_extract_array::<f32>()
            .map_err(classify)?;
        Ok(view.to_owned())
    }

    fn run_f16(&self, input: ArrayD<f32>) -> Result<ArrayD<f32>, TransformError> {
        let shape = input.shape().to_vec();
        let f32_slice = input
            .as_slice()
            .expect("batched tile tensor is contiguous");
        let mut fp16_data = vec![f16::ZERO; f32_slice.len()];
        fp16_data.convert_from_f32_slice(f32_slice);
        let fp16_array = ArrayD::from_shape_vec(shape, fp16_data)
            .map_err(|e| TransformError::Backend(e.to_string()))?;

        let input_tensor = Tensor::from_array(fp16_array).map_err(classify)?;
        let mut session = self.session.lock().expect("session lock poisoned");
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => &input_tensor])
            .map_err(classify)?;
        let view = outputs[self.output_name.as_str()]
            .try_extract_array::<f16>()
            .map_err(classify)?;

        let fp16_owned;
        let fp16_slice = if let Some(s) = view.as_slice() {
            s
        } else {
            fp16_owned = view.as_standard_layout().into_owned();
            fp16_owned.as_slice().expect("standard layout is contiguous")
        };
        let mut f32_data = vec![0.0f32; fp16_slice.len()];
        fp16_slice.convert_to_f32_slice(&mut f32_data);

        ArrayD::from_shape_vec(view.shape().to_vec(), f32_data)
            .map_err(|e| TransformError::Backend(e.to_string()))
    }
}

impl Transform for OrtTransform {
    fn apply(&self, tile: &Array3<f32>) -> Result<Array3<f32>, TransformError> {
        let (c, h, w) = tile.dim();
        if c != CHANNELS {
            return Err(TransformError::Shape {
                expected: [CHANNELS, h, w],
                got: vec![c, h, w],
            });
        }

        let input = tile.to_owned().insert_axis(Axis(0)).into_dyn();
        let output = if self.is_fp16 {
            self.run_f16(input)?
        } else {
            self.run_f32(input)?
        };

        let scale = self.scale_factor();
        let expected = [1, CHANNELS, h * scale, w * scale];
        if output.shape() != expected {
            return Err(TransformError::Shape {
                expected: [CHANNELS, h * scale, w * scale],
                got: output.shape().to_vec(),
            });
        }

        let out4 = output
            .into_dimensionality::<Ix4>()
            .map_err(|e| TransformError::Backend(e.to_string()))?;
        Ok(out4.index_axis_move(Axis(0), 0))
    }
}
