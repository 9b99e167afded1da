//! # Style Grading
//!
//! One free-text style tag per job is classified into a closed set of grades,
//! then looked up in a registry and applied to every frame.
//!
//! ## Grades
//!
//! - **Noir**: full desaturation, contrast x1.2
//! - **Cyberpunk**: contrast x1.2
//! - **Vintage**: saturation x1.1
//! - **Cinematic** / **None**: untouched
//!
//! ## Usage
//!
//! ```rust
//! use scene_compositor::styles::{StyleGrade, StyleRegistry};
//!
//! let registry = StyleRegistry::new();
//! let (grade, style) = registry.resolve("Film Noir");
//! assert_eq!(grade, StyleGrade::Noir);
//! assert_eq!(style.name(), "noir");
//! ```

pub mod grade;
pub mod passthrough;
pub mod registry;
pub mod traits;

pub mod cyberpunk;
pub mod noir;
pub mod vintage;

pub use grade::StyleGrade;
pub use passthrough::PassthroughStyle;
pub use registry::StyleRegistry;
pub use traits::Style;

pub use cyberpunk::CyberpunkStyle;
pub use noir::NoirStyle;
pub use vintage::VintageStyle;
