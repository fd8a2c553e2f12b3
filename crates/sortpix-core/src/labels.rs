//! Class-name vocabularies for the detector and the classifier.
//!
//! Both files are newline-delimited; the class id is the physical line
//! index, so a blank line still occupies an id. Loading failures are fatal:
//! nothing can be tagged without labels.

use std::collections::HashMap;
use std::path::Path;

use crate::error::LabelError;

/// Read-only label vocabularies, loaded once per run.
#[derive(Debug, Clone)]
pub struct LabelStore {
    detector: Vec<String>,
    classifier: HashMap<usize, String>,
}

impl LabelStore {
    /// Load both vocabulary files.
    pub fn load(detector_path: &Path, classifier_path: &Path) -> Result<Self, LabelError> {
        let detector = read_labels(detector_path)?;
        let classifier = read_labels(classifier_path)?
            .into_iter()
            .enumerate()
            .collect::<HashMap<_, _>>();

        tracing::info!(
            "Loaded labels: {} detector classes, {} classifier classes",
            detector.len(),
            classifier.len()
        );

        Ok(Self {
            detector,
            classifier,
        })
    }

    /// Build a store from in-memory label lists.
    pub fn from_lists(detector: Vec<String>, classifier: Vec<String>) -> Self {
        Self {
            detector,
            classifier: classifier.into_iter().enumerate().collect(),
        }
    }

    /// Detector label for a class id, `Unknown(<id>)` when out of range.
    pub fn detector_label(&self, class_id: usize) -> String {
        self.detector
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| unknown(class_id))
    }

    /// Classifier label for a class id, `Unknown(<id>)` when out of range.
    pub fn classifier_label(&self, class_id: usize) -> String {
        self.classifier
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| unknown(class_id))
    }

    pub fn detector_len(&self) -> usize {
        self.detector.len()
    }

    pub fn classifier_len(&self) -> usize {
        self.classifier.len()
    }

    /// Union of both vocabularies, sorted and de-duplicated ignoring case.
    pub fn all_labels(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .detector
            .iter()
            .chain(self.classifier.values())
            .filter(|l| !l.is_empty())
            .cloned()
            .collect();
        all.sort_by_key(|l| l.to_lowercase());
        all.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        all
    }
}

fn unknown(class_id: usize) -> String {
    format!("Unknown({class_id})")
}

fn read_labels(path: &Path) -> Result<Vec<String>, LabelError> {
    let content = std::fs::read_to_string(path).map_err(|source| LabelError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let labels: Vec<String> = content.lines().map(|l| l.trim().to_string()).collect();

    if labels.iter().all(|l| l.is_empty()) {
        return Err(LabelError::Empty(path.to_path_buf()));
    }
    Ok(labels)
}
