//! Accuracy of predicted tags against manual ground truth.
//!
//! Every manually tagged image is located under the input root, inferred
//! again, and compared over the vocabulary of all tags seen on either side.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::inference::InferenceAdapter;
use crate::math::macro_f1;
use crate::overrides::OverrideStore;
use crate::pipeline::discovery::FileDiscovery;
use crate::types::EvaluationReport;

/// Ground truth and prediction for one image.
#[derive(Debug, Clone)]
pub struct Sample {
    pub truth: BTreeSet<String>,
    pub predicted: BTreeSet<String>,
}

/// Recomputes predictions for manually tagged images and scores them.
pub struct Evaluator {
    adapter: Arc<dyn InferenceAdapter>,
    discovery: FileDiscovery,
}

impl Evaluator {
    pub fn new(adapter: Arc<dyn InferenceAdapter>, discovery: FileDiscovery) -> Self {
        Self { adapter, discovery }
    }

    /// Collect samples for every manual entry that can be found and inferred.
    pub fn collect(&self, input_root: &Path, overrides: &OverrideStore) -> Vec<Sample> {
        if overrides.manual_entries().is_empty() {
            return Vec::new();
        }

        let index = self.discovery.index_by_name(input_root);
        let mut samples = Vec::new();

        for entry in overrides.manual_entries() {
            let Some(path) = index.get(&entry.image_name) else {
                tracing::warn!(
                    "Manually tagged image {:?} not found under {:?}",
                    entry.image_name,
                    input_root
                );
                continue;
            };
            match self.adapter.infer(path) {
                Ok(output) => samples.push(Sample {
                    truth: entry.tags.iter().cloned().collect(),
                    predicted: output.predicted_tags(),
                }),
                Err(e) => {
                    tracing::warn!("Skipping {:?} in evaluation: {}", path, e);
                }
            }
        }
        samples
    }

    /// Run the full evaluation pass.
    pub fn evaluate(&self, input_root: &Path, overrides: &OverrideStore) -> EvaluationReport {
        let report = score(&self.collect(input_root, overrides));
        tracing::info!("{}", report);
        report
    }
}

/// Macro F1 over the union vocabulary of all samples.
pub fn score(samples: &[Sample]) -> EvaluationReport {
    let vocabulary: Vec<&String> = samples
        .iter()
        .flat_map(|s| s.truth.iter().chain(s.predicted.iter()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let indicators = |set: &BTreeSet<String>| -> Vec<bool> {
        vocabulary.iter().map(|tag| set.contains(*tag)).collect()
    };
    let truth: Vec<Vec<bool>> = samples.iter().map(|s| indicators(&s.truth)).collect();
    let predicted: Vec<Vec<bool>> = samples.iter().map(|s| indicators(&s.predicted)).collect();

    match macro_f1(&truth, &predicted) {
        Some(macro_f1) => EvaluationReport::Score {
            macro_f1,
            images: samples.len(),
            labels: vocabulary.len(),
        },
        None => EvaluationReport::NoData,
    }
}
