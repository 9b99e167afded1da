//! # Cyberpunk Grade
//!
//! A plain contrast boost. No hue-targeted curve is applied.

mod effect;

pub use effect::CyberpunkStyle;

pub const CYBERPUNK_CONTRAST: f32 = 1.2;
