//! SortPix Core - batch image tagging library.
//!
//! SortPix runs every image under an input root through an object detector
//! and an image classifier, then files the image under one directory per
//! predicted tag using symbolic links. A skip list and a manual-tag table
//! override the models per file name, and the manual table doubles as
//! ground truth for a macro-F1 evaluation at the end of each run.
//!
//! # Architecture
//!
//! ```text
//! Discover → Resolve (skip / manual / automatic) → Infer → Link per tag → Log
//!                                                         ↓
//!                                              Evaluate against manual tags
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use sortpix_core::{Config, SortPix};
//!
//! #[tokio::main]
//! async fn main() -> sortpix_core::Result<()> {
//!     let config = Config::load()?;
//!     let sortpix = SortPix::new(config)?;
//!
//!     let report = sortpix.run(|_| {}).await?;
//!     println!("{}", report.evaluation);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod evaluation;
pub mod inference;
pub mod labels;
pub mod math;
pub mod overrides;
pub mod pipeline;
pub mod types;

use std::sync::Arc;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, InferenceError, LabelError, OverrideError, PipelineError, PipelineResult,
    Result, SortPixError,
};
pub use inference::{InferenceAdapter, OnnxInference};
pub use labels::LabelStore;
pub use overrides::OverrideStore;
pub use pipeline::BatchDriver;
pub use types::{
    BatchReport, Classification, Detection, EvaluationReport, ImageRecord, InferenceOutput,
    UnitOutcome, UnitResult,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// SortPix tagger - the main entry point for a batch run.
///
/// Construction loads everything a run depends on. Missing label files or
/// model files fail here, before any image is touched. Broken override files
/// do not; they are treated as empty.
pub struct SortPix {
    config: Config,
    labels: Arc<LabelStore>,
    overrides: Arc<OverrideStore>,
    driver: BatchDriver,
}

impl SortPix {
    /// Load labels, overrides and both models for `config`.
    pub fn new(config: Config) -> Result<Self> {
        tracing::debug!("Initializing SortPix v{}", VERSION);

        let labels = Arc::new(LabelStore::load(
            &config.detector_labels(),
            &config.classifier_labels(),
        )?);
        tracing::info!(
            "Loaded {} detector and {} classifier labels",
            labels.detector_len(),
            labels.classifier_len()
        );

        let overrides = Arc::new(OverrideStore::load(
            &config.skip_list(),
            &config.manual_tags(),
        ));

        let adapter: Arc<dyn InferenceAdapter> =
            Arc::new(OnnxInference::load(&config, labels.clone())?);
        let driver = BatchDriver::new(&config, adapter, overrides.clone());

        Ok(Self {
            config,
            labels,
            overrides,
            driver,
        })
    }

    /// Create a SortPix instance from the default config file.
    pub fn with_defaults() -> Result<Self> {
        let config = Config::load()?;
        Self::new(config)
    }

    /// Tag every image under the input root, then evaluate.
    pub async fn run<F>(&self, on_result: F) -> Result<BatchReport>
    where
        F: Fn(&UnitResult) + Send + Sync + 'static,
    {
        self.driver.run(on_result).await
    }

    /// Only score the models against the manual tags.
    pub async fn evaluate(&self) -> EvaluationReport {
        self.driver.evaluate().await
    }

    /// The batch driver, for callers that discover files up front.
    pub fn driver(&self) -> &BatchDriver {
        &self.driver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }
}
