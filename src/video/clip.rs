use std::fmt;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    assets::{AssetKind, ResolvedAsset, ResolvedNarration},
    composition::job::CancellationFlag,
    config::Config,
    error::{CompositionError, CompositorError, OverlayError, Result, VideoError},
    styles::Style,
    video::{
        canonicalizer::FrameCanonicalizer,
        motion::{MotionPlan, ZoomPath},
        overlay::{should_caption, CaptionLayer, CaptionRenderer},
        probe::MediaProbe,
        source::{FrameSource, MotionSource, StillSource},
        types::{Frame, FrameGeometry},
    },
};

/// One scene's video, normalized to the job's frame geometry and rate
///
/// Owns its decode handle; dropping the clip releases it.
pub struct CanonicalClip {
    pub scene_index: usize,
    pub kind: AssetKind,
    pub geometry: FrameGeometry,
    pub fps: f64,
    pub duration: f64,
    pub narration: Option<ResolvedNarration>,
    source: Box<dyn FrameSource>,
    caption: Option<CaptionLayer>,
}

impl CanonicalClip {
    pub fn new(
        scene_index: usize,
        kind: AssetKind,
        geometry: FrameGeometry,
        fps: f64,
        duration: f64,
        source: Box<dyn FrameSource>,
    ) -> Self {
        Self {
            scene_index,
            kind,
            geometry,
            fps,
            duration,
            narration: None,
            source,
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: Option<CaptionLayer>) -> Self {
        self.caption = caption;
        self
    }

    pub fn with_narration(mut self, narration: Option<ResolvedNarration>) -> Self {
        self.narration = narration;
        self
    }

    pub fn has_caption(&self) -> bool {
        self.caption.is_some()
    }

    /// Pull the next frame, grade it, then burn in the caption
    pub fn render_frame(&mut self, style: &dyn Style) -> Result<Frame> {
        let mut frame = self.source.next_frame()?;
        if frame.geometry() != self.geometry {
            return Err(VideoError::FrameProcessingFailed {
                reason: format!(
                    "scene {}: source produced {}, expected {}",
                    self.scene_index,
                    frame.geometry(),
                    self.geometry
                ),
            }.into());
        }

        if !style.is_identity() {
            style.apply_effect(&mut frame)?;
        }
        if let Some(caption) = &self.caption {
            caption.composite(&mut frame);
        }
        Ok(frame)
    }
}

impl fmt::Debug for CanonicalClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalClip")
            .field("scene_index", &self.scene_index)
            .field("kind", &self.kind)
            .field("geometry", &self.geometry)
            .field("fps", &self.fps)
            .field("duration", &self.duration)
            .field("narration", &self.narration)
            .field("caption", &self.caption.is_some())
            .finish()
    }
}

/// Per-asset result of the clip pipeline
#[derive(Debug)]
pub enum ClipOutcome {
    Built(CanonicalClip),
    Skipped {
        scene_index: usize,
        reason: CompositorError,
    },
}

impl ClipOutcome {
    pub fn scene_index(&self) -> usize {
        match self {
            ClipOutcome::Built(clip) => clip.scene_index,
            ClipOutcome::Skipped { scene_index, .. } => *scene_index,
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, ClipOutcome::Built(_))
    }
}

/// Runs canonicalize -> motion -> caption for each resolved asset
///
/// Grading happens later, per frame, when the exporter pulls frames.
pub struct ClipBuilder<'a> {
    config: &'a Config,
    canonicalizer: FrameCanonicalizer,
    captions: std::result::Result<CaptionRenderer, OverlayError>,
}

impl<'a> ClipBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self::with_captions(config, CaptionRenderer::load(&config.overlay))
    }

    pub fn with_captions(
        config: &'a Config,
        captions: std::result::Result<CaptionRenderer, OverlayError>,
    ) -> Self {
        let geometry = FrameGeometry::new(config.output.width, config.output.height);
        Self {
            config,
            canonicalizer: FrameCanonicalizer::new(geometry),
            captions,
        }
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.canonicalizer.target()
    }

    /// Build every asset on a worker pool. Outcomes come back in input order.
    ///
    /// `zooms[i]` is the motion path for `assets[i]`; stills without one are
    /// rendered static.
    pub fn build_all(
        &self,
        assets: &[ResolvedAsset],
        zooms: &[Option<ZoomPath>],
        cancel: &CancellationFlag,
    ) -> Vec<ClipOutcome> {
        info!("Building {} clips on {} threads", assets.len(), self.config.processing.threads);

        let work = || {
            assets
                .par_iter()
                .enumerate()
                .map(|(i, asset)| {
                    if cancel.is_cancelled() {
                        return ClipOutcome::Skipped {
                            scene_index: asset.scene_index,
                            reason: CompositionError::Cancelled {
                                stage: "clip building".to_string(),
                            }.into(),
                        };
                    }
                    self.build(asset, zooms.get(i).copied().flatten())
                })
                .collect::<Vec<_>>()
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.processing.threads)
            .build()
        {
            Ok(pool) => pool.install(work),
            Err(e) => {
                warn!("Could not size worker pool ({}), using the global pool", e);
                work()
            }
        }
    }

    /// Build a single clip; failures become a `Skipped` outcome
    pub fn build(&self, asset: &ResolvedAsset, zoom: Option<ZoomPath>) -> ClipOutcome {
        match self.build_clip(asset, zoom) {
            Ok(clip) => {
                debug!("Scene {}: clip ready ({:?}, {:.2}s, caption: {})",
                       clip.scene_index, clip.kind, clip.duration, clip.has_caption());
                ClipOutcome::Built(clip)
            }
            Err(reason) => {
                warn!("Scene {}: skipping clip: {}", asset.scene_index, reason);
                ClipOutcome::Skipped {
                    scene_index: asset.scene_index,
                    reason,
                }
            }
        }
    }

    fn build_clip(&self, asset: &ResolvedAsset, zoom: Option<ZoomPath>) -> Result<CanonicalClip> {
        let fps = self.config.output.fps;
        let path = &asset.source_path;

        let source: Box<dyn FrameSource> = match asset.kind {
            AssetKind::Still => {
                let image = image::open(path)
                    .map_err(|e| VideoError::LoadFailed {
                        path: format!("{}: {}", path.display(), e),
                    })?
                    .to_rgb8();
                let base = self.canonicalizer.canonicalize(&image)?;
                Box::new(StillSource::new(base, zoom, fps))
            }
            AssetKind::Motion => {
                let info = MediaProbe::motion_info(path)?;
                let crop = self.canonicalizer.plan(info.geometry)?;
                let plan = MotionPlan::for_durations(info.duration, asset.duration);
                debug!("Scene {}: motion source {:?}s -> {:.2}s, {:?}",
                       asset.scene_index, info.duration, asset.duration, plan);
                let source = MotionSource::new(path.clone(), crop, plan, asset.duration, fps);
                source.verify()?;
                Box::new(source)
            }
        };

        Ok(CanonicalClip::new(
            asset.scene_index,
            asset.kind,
            self.geometry(),
            fps,
            asset.duration,
            source,
        )
        .with_narration(asset.narration.clone())
        .with_caption(self.caption_for(asset)))
    }

    fn caption_for(&self, asset: &ResolvedAsset) -> Option<CaptionLayer> {
        let text = asset
            .caption
            .as_deref()
            .filter(|text| should_caption(text, self.config.overlay.min_chars))?;

        let rendered = self
            .captions
            .as_ref()
            .map_err(|e| OverlayError::RenderFailed { reason: e.to_string() })
            .and_then(|renderer| renderer.render(text, self.geometry()));

        match rendered {
            Ok(layer) => Some(layer),
            Err(e) => {
                warn!("Scene {}: caption dropped: {}", asset.scene_index, e);
                None
            }
        }
    }
}
