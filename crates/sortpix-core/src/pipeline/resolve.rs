//! Tag resolution: skip beats manual, manual beats automatic.

use crate::overrides::OverrideStore;
use crate::types::{InferenceOutput, Resolution};

/// Decide how an image's tags are chosen.
pub fn resolve(overrides: &OverrideStore, image_name: &str) -> Resolution {
    if overrides.is_skipped(image_name) {
        Resolution::Skipped
    } else if let Some(tags) = overrides.manual_tags_for(image_name) {
        Resolution::Manual(tags.to_vec())
    } else {
        Resolution::Automatic
    }
}

/// Tags to place for an image that was not skipped.
pub fn placement_tags(resolution: &Resolution, output: &InferenceOutput) -> Vec<String> {
    match resolution {
        Resolution::Manual(tags) => tags.clone(),
        Resolution::Automatic => output.predicted_tags().into_iter().collect(),
        Resolution::Skipped => Vec::new(),
    }
}
