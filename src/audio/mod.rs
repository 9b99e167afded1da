//! # Audio Mixing Module
//!
//! Decodes music, ambient and narration sources and mixes them into one
//! composite track aligned to the video timeline.
//!
//! ## Mixing policy
//!
//! - **Narration**: the job-wide track plays at unity gain, narration attached
//!   to a scene is boosted and starts at that scene's timeline offset
//! - **Music**: ducked when any narration layer is present, faded in and out
//! - **Ambient**: fixed gain, all layers start at zero
//!
//! Every layer is cut at the timeline's end. A layer that fails to decode is
//! dropped with a warning and never fails the job.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scene_compositor::audio::{AudioMixer, AudioSources};
//! use scene_compositor::config::AudioConfig;
//!
//! # fn main() -> scene_compositor::Result<()> {
//! let config = AudioConfig::default();
//! let sources = AudioSources {
//!     music: Some("song.mp3".into()),
//!     ..Default::default()
//! };
//!
//! let composite = AudioMixer::new(&config).mix(&sources, &[], 30.0)?;
//! println!("{} layers mixed", composite.layers.len());
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod mixer;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use loader::AudioLoader;
pub use mixer::{AudioMixer, AudioSources, CompositeAudio, SceneNarration};
pub use types::{AudioData, AudioLayer, LayerKind};
