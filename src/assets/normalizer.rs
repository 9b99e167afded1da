use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    assets::types::{AssetKind, MediaAsset, ResolvedAsset, ResolvedNarration},
    audio::AudioLoader,
    config::AssetConfig,
    error::{AssetError, CompositionError, Result},
};

/// Result of normalizing one job's asset list
#[derive(Debug)]
pub struct NormalizedAssets {
    /// Survivors, in the order they were supplied
    pub resolved: Vec<ResolvedAsset>,

    /// Skipped assets with the reason each was dropped
    pub skipped: Vec<AssetError>,
}

impl NormalizedAssets {
    /// Sum of resolved durations, i.e. the expected timeline length
    pub fn total_duration(&self) -> f64 {
        self.resolved.iter().map(|a| a.duration).sum()
    }
}

/// Validates assets and reconciles their durations with narration length
pub struct AssetNormalizer<'a> {
    config: &'a AssetConfig,
    min_duration: f64,
}

impl<'a> AssetNormalizer<'a> {
    pub fn new(config: &'a AssetConfig) -> Self {
        Self { config, min_duration: 0.0 }
    }

    /// Raise shorter scenes to one frame at `fps` so none sequences to zero frames
    pub fn with_frame_rate(mut self, fps: f64) -> Self {
        if fps.is_finite() && fps > 0.0 {
            self.min_duration = 1.0 / fps;
        }
        self
    }

    /// Normalize the whole list. Fails only when nothing survives.
    pub fn normalize(&self, assets: &[MediaAsset]) -> Result<NormalizedAssets> {
        let mut resolved = Vec::with_capacity(assets.len());
        let mut skipped = Vec::new();

        for asset in assets {
            match self.resolve(asset) {
                Ok(r) => {
                    debug!("Scene {}: {:?} {:?} for {:.2}s",
                           r.scene_index, r.kind, r.source_path, r.duration);
                    resolved.push(r);
                }
                Err(reason) => {
                    warn!("Skipping asset: {}", reason);
                    skipped.push(reason);
                }
            }
        }

        if resolved.is_empty() {
            return Err(CompositionError::EmptyTimeline.into());
        }

        info!("Normalized {} assets ({} skipped)", resolved.len(), skipped.len());
        Ok(NormalizedAssets { resolved, skipped })
    }

    /// Resolve a single asset or explain why it has to be skipped
    pub fn resolve(&self, asset: &MediaAsset) -> std::result::Result<ResolvedAsset, AssetError> {
        let scene = asset.scene_index;

        let source_path = match asset.source_path.as_deref() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => {
                return Err(AssetError::Missing {
                    scene,
                    path: "<none>".to_string(),
                })
            }
        };

        let kind = AssetKind::from_path(source_path).ok_or_else(|| AssetError::UnsupportedKind {
            scene,
            path: source_path.display().to_string(),
        })?;

        if !is_readable_file(source_path) {
            return Err(AssetError::Missing {
                scene,
                path: source_path.display().to_string(),
            });
        }

        let requested = asset
            .requested_duration
            .unwrap_or(self.config.default_scene_duration);
        if !(requested.is_finite() && requested > 0.0) {
            return Err(AssetError::InvalidDuration { scene, duration: requested });
        }

        let narration = asset
            .narration_path
            .as_deref()
            .and_then(|path| Self::resolve_narration(scene, path));

        // Extend to the narration, never shorten
        let duration = match &narration {
            Some(n) if n.duration > requested => {
                debug!("Scene {}: extending {:.2}s -> {:.2}s to fit narration",
                       scene, requested, n.duration);
                n.duration
            }
            _ => requested,
        };
        let duration = if duration < self.min_duration {
            debug!("Scene {}: {:.4}s is under one frame, raising to {:.4}s",
                   scene, duration, self.min_duration);
            self.min_duration
        } else {
            duration
        };

        Ok(ResolvedAsset {
            scene_index: scene,
            source_path: source_path.to_path_buf(),
            kind,
            duration,
            narration,
            caption: asset.text_overlay.clone(),
        })
    }

    fn resolve_narration(scene: usize, path: &Path) -> Option<ResolvedNarration> {
        match AudioLoader::probe_duration(path) {
            Ok(duration) if duration > 0.0 => Some(ResolvedNarration {
                path: path.to_path_buf(),
                duration,
            }),
            Ok(_) => {
                warn!("Scene {}: narration {:?} is empty, ignoring it", scene, path);
                None
            }
            Err(e) => {
                warn!("Scene {}: narration unusable, ignoring it: {}", scene, e);
                None
            }
        }
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}
