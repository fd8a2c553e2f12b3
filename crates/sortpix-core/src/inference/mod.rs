//! Detector + classifier inference behind a single adapter trait.
//!
//! The batch driver and the evaluator only see [`InferenceAdapter`]; the
//! production implementation [`OnnxInference`] runs two ONNX models, and
//! tests substitute a scripted one.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sortpix_core::{Config, LabelStore, OnnxInference, InferenceAdapter};
//!
//! let config = Config::load()?;
//! let labels = LabelStore::load(&config.detector_labels(), &config.classifier_labels())?;
//! let adapter = OnnxInference::load(&config, std::sync::Arc::new(labels))?;
//! let output = adapter.infer(std::path::Path::new("cat.jpg"))?;
//! ```

pub mod classifier;
pub mod detector;
pub(crate) mod preprocess;
pub mod session;

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::InferenceError;
use crate::labels::LabelStore;
use crate::types::{Classification, Detection, InferenceOutput};

use self::classifier::Classifier;
use self::detector::Detector;

/// Runs both models on one image.
///
/// Implementations must be callable from several worker threads at once.
pub trait InferenceAdapter: Send + Sync {
    fn infer(&self, path: &Path) -> Result<InferenceOutput, InferenceError>;
}

/// ONNX Runtime implementation of [`InferenceAdapter`].
pub struct OnnxInference {
    detector: Detector,
    classifier: Classifier,
    labels: Arc<LabelStore>,
}

impl OnnxInference {
    /// Load both models from the configured model directory.
    pub fn load(config: &Config, labels: Arc<LabelStore>) -> Result<Self, InferenceError> {
        let detector = Detector::load(&config.detector_model(), config.detector.clone())?;
        let classifier = Classifier::load(&config.classifier_model(), config.classifier.clone())?;
        tracing::info!("Models loaded successfully");
        Ok(Self {
            detector,
            classifier,
            labels,
        })
    }
}

impl InferenceAdapter for OnnxInference {
    fn infer(&self, path: &Path) -> Result<InferenceOutput, InferenceError> {
        let image = decode(path)?;

        let detections = self
            .detector
            .detect(&image, path)?
            .into_iter()
            .map(|b| Detection {
                tag: self.labels.detector_label(b.class_id),
                confidence: b.confidence,
            })
            .collect();

        let (class_id, confidence) = self.classifier.classify(&image, path)?;
        let classification = Classification {
            label: self.labels.classifier_label(class_id),
            confidence,
        };

        Ok(InferenceOutput {
            detections,
            classification,
        })
    }
}

/// Decode an image, detecting the format from content rather than extension.
fn decode(path: &Path) -> Result<image::DynamicImage, InferenceError> {
    let decode_err = |message: String| InferenceError::Decode {
        path: path.to_path_buf(),
        message,
    };
    image::ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(format!("Cannot detect image format: {e}")))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        let err = decode(&path).unwrap_err();
        assert!(matches!(err, InferenceError::Decode { .. }));
    }

    #[test]
    fn test_decode_by_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actually_png.jpg");
        image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        let img = decode(&path).unwrap();
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn test_missing_model_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.paths.model_dir = dir.path().to_path_buf();
        let labels = Arc::new(LabelStore::from_lists(vec!["a".into()], vec!["b".into()]));
        let err = OnnxInference::load(&config, labels).err().unwrap();
        assert!(matches!(err, InferenceError::Model { .. }));
    }
}
