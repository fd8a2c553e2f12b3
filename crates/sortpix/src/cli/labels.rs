//! The `sortpix labels` command: every tag either model can produce.

use sortpix_core::{Config, LabelStore};

/// Print the merged detector and classifier vocabulary, one label per line.
pub fn execute(config: &Config) -> anyhow::Result<()> {
    let labels = LabelStore::load(&config.detector_labels(), &config.classifier_labels())?;
    for label in labels.all_labels() {
        println!("{label}");
    }
    Ok(())
}
