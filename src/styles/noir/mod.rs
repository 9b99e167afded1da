//! # Noir Grade
//!
//! Full desaturation to BT.601 luma followed by a contrast boost.

mod effect;

pub use effect::NoirStyle;

/// Contrast multiplier applied after desaturation
pub const NOIR_CONTRAST: f32 = 1.2;
