//! # Video Pipeline
//!
//! Turns each resolved asset into a [`CanonicalClip`] with the job's fixed
//! geometry and frame rate, then encodes the finished timeline.
//!
//! Per asset: canonicalize (scale + centre crop), attach motion (zoom for
//! stills, loop/trim for motion clips), pre-render the caption. Frames are
//! produced lazily when the [`Exporter`] pulls them, graded on the way out,
//! and streamed to ffmpeg; no clip is ever held fully decoded in memory.

pub mod canonicalizer;
pub mod clip;
pub mod exporter;
pub mod motion;
pub mod overlay;
pub mod probe;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use canonicalizer::{CropPlan, FrameCanonicalizer};
pub use clip::{CanonicalClip, ClipBuilder, ClipOutcome};
pub use exporter::{Exporter, OutputNamer};
pub use motion::{MotionPlan, MotionSynthesizer, ZoomDirection, ZoomPath};
pub use overlay::{CaptionLayer, CaptionRenderer};
pub use probe::{MediaInfo, MediaProbe};
pub use source::{FrameSource, MotionSource, StillSource};
pub use types::{Frame, FrameGeometry};
