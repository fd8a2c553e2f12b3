//! ONNX Runtime session management shared by the detector and the classifier.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Value;

use crate::error::InferenceError;

/// Raw first output of a model: shape plus row-major data.
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
}

/// Wraps an ONNX Runtime session for single-image inference.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct OnnxSession {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
    model_path: PathBuf,
}

impl OnnxSession {
    /// Load a model from an ONNX file.
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        if !model_path.exists() {
            return Err(InferenceError::Model {
                path: model_path.to_path_buf(),
                message: "Model file not found".to_string(),
            });
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to create ONNX session builder: {e}"),
            })?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError::Model {
                path: model_path.to_path_buf(),
                message: format!("Failed to load ONNX model: {e}"),
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "images".to_string());

        tracing::debug!(
            "Loaded ONNX model from {:?} (input: {:?}, outputs: {:?})",
            model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            model_path: model_path.to_path_buf(),
        })
    }

    /// Run the model on one preprocessed tensor and return its first output.
    ///
    /// `image` is only used to attribute errors.
    pub fn run(&self, tensor: &Array4<f32>, image: &Path) -> Result<RawOutput, InferenceError> {
        let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = tensor.iter().copied().collect();

        let input_value =
            Value::from_array((shape, flat_data)).map_err(|e| InferenceError::Model {
                path: image.to_path_buf(),
                message: format!("Failed to create input tensor: {e}"),
            })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self.session.lock().map_err(|e| InferenceError::Model {
            path: self.model_path.clone(),
            message: format!("Session lock poisoned: {e}"),
        })?;

        let outputs = session.run(inputs).map_err(|e| InferenceError::Model {
            path: image.to_path_buf(),
            message: format!("ONNX inference failed: {e}"),
        })?;

        let (_, first) = outputs
            .iter()
            .next()
            .ok_or_else(|| InferenceError::Output {
                path: image.to_path_buf(),
                message: "Model produced no outputs".to_string(),
            })?;

        let (shape, data) =
            first
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::Output {
                    path: image.to_path_buf(),
                    message: format!("Failed to extract output tensor: {e}"),
                })?;

        Ok(RawOutput {
            shape: shape.iter().copied().collect(),
            data: data.to_vec(),
        })
    }
}
