//! Command handlers for the `sortpix` binary.

pub mod config;
pub mod evaluate;
pub mod labels;
pub mod overrides;
pub mod run;
