//! Core data types shared across the tagging pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// An image found under the input root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Absolute path to the source file
    pub path: PathBuf,

    /// Path relative to the input root, including the file name
    pub relative: PathBuf,
}

impl ImageRecord {
    /// The file name, used as the key into the override tables.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One object found by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector class name
    pub tag: String,

    /// Confidence score from 0.0 to 1.0
    pub confidence: f32,
}

/// Top-1 classifier prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

/// Everything the two models say about one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceOutput {
    /// May be empty
    pub detections: Vec<Detection>,
    pub classification: Classification,
}

impl InferenceOutput {
    /// Union of detection tags and the classifier label, sorted.
    pub fn predicted_tags(&self) -> BTreeSet<String> {
        self.detections
            .iter()
            .map(|d| d.tag.clone())
            .chain(std::iter::once(self.classification.label.clone()))
            .collect()
    }
}

/// How the tags of one image are decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Listed in the skip set: nothing is produced
    Skipped,
    /// Listed in the manual map: place exactly these tags
    Manual(Vec<String>),
    /// Place whatever the models predict
    Automatic,
}

/// What happened to an image that was processed successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Skipped,
    Manual { tags: Vec<String>, links_created: usize },
    Automatic { tags: Vec<String>, links_created: usize },
}

/// Result of one unit of work in the batch.
#[derive(Debug)]
pub enum UnitResult {
    Success(PathBuf, UnitOutcome),
    Failure(PathBuf, String),
}

impl UnitResult {
    pub fn path(&self) -> &PathBuf {
        match self {
            UnitResult::Success(path, _) | UnitResult::Failure(path, _) => path,
        }
    }
}

/// Aggregate accuracy of predictions against manual ground truth.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationReport {
    /// No manually tagged image could be matched and inferred
    NoData,
    Score {
        macro_f1: f64,
        /// Number of images that contributed
        images: usize,
        /// Size of the observed tag vocabulary
        labels: usize,
    },
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationReport::NoData => write!(f, "Macro F1: no data"),
            EvaluationReport::Score { macro_f1, .. } => write!(f, "Macro F1: {macro_f1:.4}"),
        }
    }
}

/// Summary of a full batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub discovered: usize,
    pub automatic: usize,
    pub manual: usize,
    pub skipped: usize,
    /// Failed images with their error messages
    pub failures: Vec<(PathBuf, String)>,
    /// Shortcuts created during this run (existing ones are not counted)
    pub links_created: usize,
    pub elapsed: Duration,
    pub evaluation: EvaluationReport,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.automatic + self.manual
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
