//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem locations used by a run.
///
/// Every path may start with `~`; it is expanded when the path is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the image tree to tag
    pub input_dir: PathBuf,

    /// Root of the per-tag symlink tree
    pub output_dir: PathBuf,

    /// Directory holding the ONNX models
    pub model_dir: PathBuf,

    /// Newline-delimited detector class names (class id = line index)
    pub detector_labels: PathBuf,

    /// Newline-delimited classifier class names (class id = line index)
    pub classifier_labels: PathBuf,

    /// JSON skip list
    pub skip_list: PathBuf,

    /// JSON manual-tag map
    pub manual_tags: PathBuf,

    /// Plain-text confidence log, truncated on every run
    pub confidence_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("~/.sortpix/images"),
            output_dir: PathBuf::from("~/.sortpix/processed"),
            model_dir: PathBuf::from("~/.sortpix/models"),
            detector_labels: PathBuf::from("~/.sortpix/labels/coco.names"),
            classifier_labels: PathBuf::from("~/.sortpix/labels/imagenet_classes.txt"),
            skip_list: PathBuf::from("~/.sortpix/SkipImages.json"),
            manual_tags: PathBuf::from("~/.sortpix/ManualTag.json"),
            confidence_log: PathBuf::from("~/.sortpix/confidence_log.txt"),
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers (defaults to available parallelism)
    pub parallel_workers: usize,

    /// Image extensions picked up by discovery, matched case-insensitively
    pub supported_formats: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            supported_formats: vec!["jpg".to_string(), "png".to_string(), "jpeg".to_string()],
        }
    }
}

/// Object detector settings (YOLOv8-style ONNX export).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Model file name inside `paths.model_dir`
    pub model: String,

    /// Square input size the model was exported with
    pub input_size: u32,

    /// Boxes scoring below this are dropped before NMS
    pub confidence_threshold: f32,

    /// IoU above which overlapping boxes of the same class are suppressed
    pub iou_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model: "yolov8s.onnx".to_string(),
            input_size: 640,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        }
    }
}

/// Image classifier settings (ImageNet-style ONNX export).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Model file name inside `paths.model_dir`
    pub model: String,

    /// Square input size
    pub image_size: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "mobilenet_v2.onnx".to_string(),
            image_size: 224,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
