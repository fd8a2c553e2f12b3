//! Single-label image classifier (ImageNet-style logits).

use std::path::Path;

use image::DynamicImage;

use crate::config::ClassifierConfig;
use crate::error::InferenceError;
use crate::math::{argmax, softmax};

use super::preprocess::classifier_input;
use super::session::OnnxSession;

/// Top-1 classifier backed by an ONNX session.
pub struct Classifier {
    session: OnnxSession,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn load(model_path: &Path, config: ClassifierConfig) -> Result<Self, InferenceError> {
        tracing::info!("Loading classifier from {:?}", model_path);
        let session = OnnxSession::load(model_path)?;
        Ok(Self { session, config })
    }

    /// Classify an image, returning `(class_id, probability)`.
    pub fn classify(&self, image: &DynamicImage, path: &Path) -> Result<(usize, f32), InferenceError> {
        let tensor = classifier_input(image, self.config.image_size);
        let output = self.session.run(&tensor, path)?;
        top1(&output.data).ok_or_else(|| InferenceError::Output {
            path: path.to_path_buf(),
            message: "Classifier produced no scores".to_string(),
        })
    }
}

/// Softmax the logits and return the best class.
pub fn top1(logits: &[f32]) -> Option<(usize, f32)> {
    argmax(&softmax(logits))
}
