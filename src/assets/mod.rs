//! # Asset Normalization
//!
//! Turns the externally supplied, scene-ordered asset list into validated
//! `(asset, duration)` pairs. Unusable assets are skipped with a logged reason;
//! an all-skipped list is the job-fatal "no media" condition.

pub mod normalizer;
pub mod types;

pub use normalizer::{AssetNormalizer, NormalizedAssets};
pub use types::{AssetKind, MediaAsset, ResolvedAsset, ResolvedNarration};
