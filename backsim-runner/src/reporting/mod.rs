//! Reporting and artifact export pipeline.

pub mod artifacts;
pub mod export;

pub use artifacts::{ArtifactManager, ArtifactPaths, RunSummary};
pub use export::{export_sweep, save_artifacts};
