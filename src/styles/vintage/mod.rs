//! # Vintage Grade
//!
//! A gentle saturation lift around each pixel's own luma.

mod effect;

pub use effect::VintageStyle;

pub const VINTAGE_SATURATION: f32 = 1.1;
