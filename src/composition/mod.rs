//! # Composition Engine
//!
//! Drives a job through its states: normalize the assets, build per-scene
//! clips, sequence them, mix the soundtrack and export one file.

pub mod engine;
pub mod job;
pub mod manifest;
pub mod timeline;

// Re-exports for convenience
pub use engine::AssemblyEngine;
pub use job::{CancellationFlag, JobProgress, JobState, OutputContract, RenderJob};
pub use manifest::JobManifest;
pub use timeline::{ClipSpan, Timeline};
