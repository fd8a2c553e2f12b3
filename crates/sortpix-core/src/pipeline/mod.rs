//! Batch tagging pipeline.
//!
//! - **discovery**: find images under the input root
//! - **resolve**: pick skip, manual or automatic handling per image
//! - **projector**: place per-tag shortcuts in the output tree
//! - **confidence_log**: record raw model output per image
//! - **driver**: run every image through a bounded worker pool

pub mod confidence_log;
pub mod discovery;
pub mod driver;
pub mod projector;
pub mod resolve;

pub use confidence_log::ConfidenceLog;
pub use discovery::FileDiscovery;
pub use driver::BatchDriver;
pub use projector::TagProjector;
pub use resolve::{placement_tags, resolve};
