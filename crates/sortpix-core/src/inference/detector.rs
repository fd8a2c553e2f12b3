//! YOLOv8-style object detector post-processing.
//!
//! The exported model emits `[1, 4 + classes, anchors]`: for every anchor a
//! box (`cx, cy, w, h`) followed by one score per class. Some exports are
//! transposed to `[1, anchors, 4 + classes]`; both layouts are accepted.

use std::path::Path;

use image::DynamicImage;

use crate::config::DetectorConfig;
use crate::error::InferenceError;

use super::preprocess::detector_input;
use super::session::{OnnxSession, RawOutput};

/// A detected box in model input coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBox {
    pub class_id: usize,
    pub confidence: f32,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl RawBox {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn intersection(&self, other: &RawBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
    }

    pub fn iou(&self, other: &RawBox) -> f32 {
        let inter = self.intersection(other);
        let union = self.area() + other.area() - inter;
        if union <= f32::EPSILON {
            0.0
        } else {
            inter / union
        }
    }
}

/// Object detector backed by an ONNX session.
pub struct Detector {
    session: OnnxSession,
    config: DetectorConfig,
}

impl Detector {
    pub fn load(model_path: &Path, config: DetectorConfig) -> Result<Self, InferenceError> {
        tracing::info!("Loading detector from {:?}", model_path);
        let session = OnnxSession::load(model_path)?;
        Ok(Self { session, config })
    }

    /// Detect objects, returning boxes that survive thresholding and NMS.
    pub fn detect(&self, image: &DynamicImage, path: &Path) -> Result<Vec<RawBox>, InferenceError> {
        let tensor = detector_input(image, self.config.input_size);
        let output = self.session.run(&tensor, path)?;
        let boxes = decode(&output, self.config.confidence_threshold).map_err(|message| {
            InferenceError::Output {
                path: path.to_path_buf(),
                message,
            }
        })?;
        Ok(non_max_suppression(boxes, self.config.iou_threshold))
    }
}

/// Turn raw model output into scored boxes above `threshold`.
pub fn decode(output: &RawOutput, threshold: f32) -> Result<Vec<RawBox>, String> {
    let dims: Vec<usize> = output.shape.iter().map(|&d| d.max(0) as usize).collect();
    let (rows, cols) = match dims.as_slice() {
        [1, rows, cols] | [rows, cols] => (*rows, *cols),
        _ => return Err(format!("Unexpected detector output shape: {:?}", output.shape)),
    };
    if output.data.len() < rows * cols {
        return Err(format!(
            "Detector output has {} values, expected {}",
            output.data.len(),
            rows * cols
        ));
    }

    // Attributes run along the shorter axis (84 vs 8400 for COCO).
    let transposed = rows > cols;
    let (attrs, anchors) = if transposed { (cols, rows) } else { (rows, cols) };
    if attrs <= 4 {
        return Err(format!("Detector output has no class scores: {:?}", output.shape));
    }

    let at = |attr: usize, anchor: usize| -> f32 {
        if transposed {
            output.data[anchor * attrs + attr]
        } else {
            output.data[attr * anchors + anchor]
        }
    };

    let mut boxes = Vec::new();
    for anchor in 0..anchors {
        let (class_id, confidence) = (4..attrs)
            .map(|attr| (attr - 4, at(attr, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });
        if confidence < threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
        boxes.push(RawBox {
            class_id,
            confidence: confidence.clamp(0.0, 1.0),
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        });
    }
    Ok(boxes)
}

/// Class-aware greedy NMS; output sorted by confidence, descending.
pub fn non_max_suppression(mut boxes: Vec<RawBox>, iou_threshold: f32) -> Vec<RawBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
