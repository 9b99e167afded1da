//! # Scene-Compositor
//!
//! Assemble a scene-ordered list of stills and motion clips into one
//! continuous video with a graded look, burned-in captions and a mixed
//! soundtrack.
//!
//! Every visual asset is scaled and center-cropped to one frame geometry.
//! Stills get a slow zoom, motion clips are looped or trimmed to their scene
//! duration, and a scene is never shorter than the narration attached to it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_compositor::{AssemblyEngine, AudioSources, Config, MediaAsset};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let engine = AssemblyEngine::new(Config::default())?;
//!
//! let assets = vec![
//!     MediaAsset::new(1, "shots/harbour.jpg").with_duration(4.0),
//!     MediaAsset::new(2, "shots/market.mp4").with_caption("Market day"),
//! ];
//! let audio = AudioSources {
//!     music: Some("audio/bed.mp3".into()),
//!     ..Default::default()
//! };
//!
//! let output = engine.assemble(assets, "vintage", audio).await?;
//! println!("{}", output.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`assets`] - Asset validation and duration resolution
//! - [`video`] - Canonicalization, motion, captions, clip building, export
//! - [`audio`] - Decoding and the layered mix
//! - [`styles`] - Style tag classification and color grades
//! - [`composition`] - Sequencing and the job pipeline
//! - [`config`] - Configuration management
//!
//! ## Custom Grades
//!
//! Implement [`Style`](styles::Style) and register it for a grade:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scene_compositor::styles::{Style, StyleGrade, StyleRegistry};
//! use scene_compositor::video::Frame;
//!
//! struct Sepia;
//!
//! impl Style for Sepia {
//!     fn name(&self) -> &str { "sepia" }
//!     fn description(&self) -> &str { "Brown-tinted monochrome" }
//!     fn apply_effect(&self, _frame: &mut Frame) -> scene_compositor::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = StyleRegistry::new();
//! registry.register(StyleGrade::Vintage, Arc::new(Sepia));
//! ```

pub mod assets;
pub mod audio;
pub mod composition;
pub mod config;
pub mod error;
pub mod styles;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    assets::MediaAsset,
    audio::AudioSources,
    composition::{AssemblyEngine, JobManifest},
    config::Config,
    error::{CompositorError, Result},
    styles::{Style, StyleRegistry},
};
