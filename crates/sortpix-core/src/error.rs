//! Error types for SortPix.
//!
//! Errors are split by how far they reach: startup errors (`ConfigError`,
//! `LabelError`) abort the run, while `InferenceError` is scoped to a single
//! image and only abandons that unit of work.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for SortPix operations.
#[derive(Error, Debug)]
pub enum SortPixError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Label vocabulary could not be loaded
    #[error("Label error: {0}")]
    Labels(#[from] LabelError),

    /// Model loading or inference failed
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Per-image pipeline failure
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Override file editing failed
    #[error("Override error: {0}")]
    Override(#[from] OverrideError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Vocabulary loading errors. Always fatal.
#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Failed to read label file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Label file {0} contains no labels")]
    Empty(PathBuf),
}

/// Errors raised while editing the skip list or manual-tag file.
///
/// Loading never produces these; a broken override file degrades to empty.
#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to rewrite malformed file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No tags given for {0}")]
    NoTags(String),
}

/// Failure of one unit of work in the batch. Never aborts the batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// Tag directory or shortcut could not be created
    #[error("Failed to project {path}: {source}")]
    Projection {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Confidence log could not be written
    #[error("Failed to write confidence log {path}: {source}")]
    Log {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Worker task panicked or was cancelled
    #[error("Worker failed for {path}: {message}")]
    Worker { path: PathBuf, message: String },
}

/// Per-image inference errors, plus model loading failures.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Image could not be read or decoded
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Model file missing or session could not be created/run
    #[error("Model error for {path}: {message}")]
    Model { path: PathBuf, message: String },

    /// Model produced an output of unexpected shape
    #[error("Unexpected model output for {path}: {message}")]
    Output { path: PathBuf, message: String },
}

/// Convenience type alias for SortPix results.
pub type Result<T> = std::result::Result<T, SortPixError>;

/// Convenience type alias for per-unit results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
