use std::path::PathBuf;
use std::sync::Arc;

use tokio::task;
use tracing::{debug, info};

use crate::{
    assets::{AssetKind, AssetNormalizer, MediaAsset, NormalizedAssets},
    audio::{AudioMixer, AudioSources, CompositeAudio},
    composition::{
        job::{CancellationFlag, JobProgress, JobState, OutputContract, RenderJob},
        timeline::Timeline,
    },
    config::Config,
    error::{CompositorError, Result},
    styles::StyleRegistry,
    video::{ClipBuilder, ClipOutcome, Exporter, FrameGeometry, MotionSynthesizer, ZoomPath},
};

/// Orchestrates one assembly run from asset list to output file
///
/// The pipeline follows the job state machine:
/// 1. Asset Normalization - validate assets, stretch scenes to their narration
/// 2. Clip Building - canonicalize, attach motion and captions (parallel)
/// 3. Sequencing - order clips by scene and lay them end to end
/// 4. Audio Mixing - music, ambient and narration into one track
/// 5. Export - grade, encode and mux to a timestamped file
///
/// Per-asset and per-layer problems are logged and skipped. An empty
/// timeline or a failed export ends the job; callers can tell the former
/// apart with [`CompositorError::is_no_media`].
pub struct AssemblyEngine {
    config: Arc<Config>,
    registry: Arc<StyleRegistry>,
    cancel: CancellationFlag,
}

impl AssemblyEngine {
    /// Create an engine with a validated configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(StyleRegistry::new()),
            cancel: CancellationFlag::new(),
        })
    }

    /// Use a custom style registry
    pub fn with_registry(mut self, registry: StyleRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle that cancels whatever job this engine is running
    ///
    /// A request stops the job in flight (or the next one, if none is
    /// running) and is cleared when that job returns, so the engine stays
    /// usable afterwards.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Run the whole pipeline and return the written file's path
    pub async fn assemble(
        &self,
        assets: Vec<MediaAsset>,
        style_tag: &str,
        audio: AudioSources,
    ) -> Result<PathBuf> {
        let result = self.run_assembly(assets, style_tag, audio).await;
        self.cancel.reset();
        result
    }

    /// Run every stage up to (not including) export
    pub async fn prepare(
        &self,
        assets: Vec<MediaAsset>,
        style_tag: &str,
        audio: AudioSources,
    ) -> Result<RenderJob> {
        let result = self.prepare_job(assets, style_tag, audio).await;
        self.cancel.reset();
        result
    }

    async fn run_assembly(
        &self,
        assets: Vec<MediaAsset>,
        style_tag: &str,
        audio: AudioSources,
    ) -> Result<PathBuf> {
        info!("🎬 Starting scene assembly");
        info!("   Assets: {}", assets.len());
        info!("   Style tag: {:?}", style_tag);

        let mut job = self.prepare_job(assets, style_tag, audio).await?;

        // Pipeline Step 5: Export
        let mut progress = std::mem::take(&mut job.progress);
        let exported = self.export(job).await;
        let path = progress.track(exported)?;
        progress.advance(JobState::Exported)?;

        info!("🎉 Assembly complete! Output saved to: {:?}", path);
        Ok(path)
    }

    async fn prepare_job(
        &self,
        assets: Vec<MediaAsset>,
        style_tag: &str,
        audio: AudioSources,
    ) -> Result<RenderJob> {
        let mut progress = JobProgress::new();

        // Pipeline Step 1: Asset Normalization
        let normalized = progress.track(self.normalize_assets(assets).await)?;
        progress.advance(JobState::AssetsNormalized)?;

        // Pipeline Step 2: Clip Building
        progress.track(self.cancel.check("clip building"))?;
        let outcomes = progress.track(self.build_clips(normalized).await)?;
        progress.advance(JobState::ClipsBuilt)?;

        // Pipeline Step 3: Sequencing
        progress.track(self.cancel.check("sequencing"))?;
        let timeline = progress.track(self.sequence(outcomes))?;
        progress.advance(JobState::Sequenced)?;

        // Pipeline Step 4: Audio Mixing
        progress.track(self.cancel.check("audio mixing"))?;
        let composite = progress.track(self.mix_audio(audio, &timeline).await)?;
        progress.advance(JobState::AudioMixed)?;

        let (grade, style) = self.registry.resolve(style_tag);
        info!("🎨 Style {:?} resolved to {} ({})", style_tag, grade, style.description());

        Ok(RenderJob {
            timeline,
            audio: composite,
            contract: OutputContract::from(&self.config.output),
            grade,
            style,
            progress,
        })
    }

    // ==========================================
    // PIPELINE STEP 1: ASSET NORMALIZATION
    // ==========================================

    async fn normalize_assets(&self, assets: Vec<MediaAsset>) -> Result<NormalizedAssets> {
        info!("📋 Step 1: Normalizing assets...");
        let config = Arc::clone(&self.config);

        let normalized = task::spawn_blocking(move || {
            AssetNormalizer::new(&config.assets)
                .with_frame_rate(config.output.fps)
                .normalize(&assets)
        })
        .await
        .map_err(|e| join_error("asset normalization", e))??;

        info!("   ✅ {} usable, {} skipped, {:.2}s expected",
              normalized.resolved.len(), normalized.skipped.len(), normalized.total_duration());
        Ok(normalized)
    }

    // ==========================================
    // PIPELINE STEP 2: CLIP BUILDING
    // ==========================================

    async fn build_clips(&self, normalized: NormalizedAssets) -> Result<Vec<ClipOutcome>> {
        info!("📹 Step 2: Building clips...");

        let zooms = self.plan_zooms(&normalized);
        let config = Arc::clone(&self.config);
        let cancel = self.cancel.clone();

        let outcomes = task::spawn_blocking(move || {
            ClipBuilder::new(&config).build_all(&normalized.resolved, &zooms, &cancel)
        })
        .await
        .map_err(|e| join_error("clip building", e))?;

        let built = outcomes.iter().filter(|o| o.is_built()).count();
        info!("   ✅ {} clips built, {} skipped", built, outcomes.len() - built);
        Ok(outcomes)
    }

    /// Zoom paths for stills, drawn in scene order so a fixed seed always
    /// gives the same directions no matter how the workers are scheduled
    fn plan_zooms(&self, normalized: &NormalizedAssets) -> Vec<Option<ZoomPath>> {
        let mut synth = MotionSynthesizer::from_config(&self.config.motion);
        normalized
            .resolved
            .iter()
            .map(|asset| match asset.kind {
                AssetKind::Still => {
                    let zoom = synth.zoom_for(asset.duration);
                    debug!("Scene {}: zoom {:?}", asset.scene_index, zoom.direction);
                    Some(zoom)
                }
                AssetKind::Motion => None,
            })
            .collect()
    }

    // ==========================================
    // PIPELINE STEP 3: SEQUENCING
    // ==========================================

    fn sequence(&self, outcomes: Vec<ClipOutcome>) -> Result<Timeline> {
        info!("⏱️  Step 3: Sequencing timeline...");
        let output = &self.config.output;
        Timeline::sequence(outcomes, FrameGeometry::new(output.width, output.height), output.fps)
    }

    // ==========================================
    // PIPELINE STEP 4: AUDIO MIXING
    // ==========================================

    async fn mix_audio(&self, sources: AudioSources, timeline: &Timeline) -> Result<CompositeAudio> {
        info!("🎵 Step 4: Mixing audio...");
        let config = Arc::clone(&self.config);
        let scene_narrations = timeline.scene_narrations();
        let total = timeline.duration();

        let composite = task::spawn_blocking(move || {
            AudioMixer::new(&config.audio).mix(&sources, &scene_narrations, total)
        })
        .await
        .map_err(|e| join_error("audio mixing", e))??;

        info!("   ✅ {} audio layers{}", composite.layers.len(),
              if composite.is_silent() { " (silent output)" } else { "" });
        Ok(composite)
    }

    // ==========================================
    // PIPELINE STEP 5: EXPORT
    // ==========================================

    async fn export(&self, job: RenderJob) -> Result<PathBuf> {
        info!("💾 Step 5: Exporting...");
        self.cancel.check("export")?;

        let config = Arc::clone(&self.config);
        let cancel = self.cancel.clone();
        task::spawn_blocking(move || Exporter::new(&config.output).export(job, &cancel))
            .await
            .map_err(|e| join_error("export", e))?
    }
}

fn join_error(stage: &str, e: task::JoinError) -> CompositorError {
    CompositorError::generic(format!("{} task failed: {}", stage, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::test_support::write_constant_wav, config::Config, styles::StyleGrade};
    use std::path::Path;
    use tempfile::tempdir;

    fn small_config(out: &Path) -> Config {
        let mut config = Config::default();
        config.output.width = 32;
        config.output.height = 18;
        config.output.output_dir = out.to_path_buf();
        config.motion.seed = Some(7);
        config.audio.sample_rate = 8000;
        config.processing.threads = 2;
        config
    }

    fn png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(48, 27, image::Rgb([90, 140, 200])).save(&path).unwrap();
        path
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.output.width = 0;
        assert!(AssemblyEngine::new(config).is_err());
    }

    #[tokio::test]
    async fn test_prepare_three_stills_with_music() {
        let dir = tempdir().unwrap();
        let music = dir.path().join("music.wav");
        write_constant_wav(&music, 10.0, 8000, 2, 0.2);

        let assets = (0..3)
            .map(|i| MediaAsset::new(i, png(dir.path(), &format!("{i}.png"))).with_duration(5.0))
            .collect();
        let sources = AudioSources { music: Some(music), ..Default::default() };

        let engine = AssemblyEngine::new(small_config(dir.path())).unwrap();
        let job = engine.prepare(assets, "cinematic", sources).await.unwrap();

        assert_eq!(job.state(), JobState::AudioMixed);
        assert_eq!(job.grade, StyleGrade::Cinematic);
        assert!(job.style.is_identity());
        assert!((job.duration() - 15.0).abs() < 1e-9);
        assert_eq!(job.timeline.total_frames(), 15 * 24);

        let music = &job.audio.layers[0];
        assert_eq!(music.gain, 0.6);
        assert_eq!((music.fade_in, music.fade_out), (2.0, 2.0));
        assert_eq!(job.audio.track.as_ref().unwrap().frame_count(), 15 * 8000);
    }

    #[tokio::test]
    async fn test_all_missing_is_no_media() {
        let dir = tempdir().unwrap();
        let engine = AssemblyEngine::new(small_config(dir.path())).unwrap();
        let assets = vec![MediaAsset::new(0, dir.path().join("gone.png"))];

        let err = engine
            .assemble(assets, "noir", AudioSources::default())
            .await
            .unwrap_err();
        assert!(err.is_no_media());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_building() {
        let dir = tempdir().unwrap();
        let engine = AssemblyEngine::new(small_config(dir.path())).unwrap();
        engine.cancellation().cancel();

        let assets = vec![MediaAsset::new(0, png(dir.path(), "a.png"))];
        let err = engine.prepare(assets, "", AudioSources::default()).await.unwrap_err();
        assert!(matches!(
            err,
            CompositorError::Composition(crate::error::CompositionError::Cancelled { .. })
        ));
    }

    #[tokio::test]
    async fn test_engine_usable_after_cancelled_job() {
        let dir = tempdir().unwrap();
        let engine = AssemblyEngine::new(small_config(dir.path())).unwrap();
        let assets = vec![MediaAsset::new(0, png(dir.path(), "a.png")).with_duration(1.0)];

        engine.cancellation().cancel();
        assert!(engine.prepare(assets.clone(), "", AudioSources::default()).await.is_err());
        assert!(!engine.cancellation().is_cancelled());

        let job = engine.prepare(assets, "", AudioSources::default()).await.unwrap();
        assert_eq!(job.state(), JobState::AudioMixed);
        assert_eq!(job.timeline.total_frames(), 24);
    }

    #[tokio::test]
    async fn test_cancel_also_clears_after_failed_assembly() {
        let dir = tempdir().unwrap();
        let engine = AssemblyEngine::new(small_config(dir.path())).unwrap();
        engine.cancellation().cancel();

        let assets = vec![MediaAsset::new(0, png(dir.path(), "a.png"))];
        let err = engine.assemble(assets, "", AudioSources::default()).await.unwrap_err();
        assert!(err.to_string().to_lowercase().contains("cancel"));
        assert!(!engine.cancellation().is_cancelled());
    }

    #[tokio::test]
    async fn test_repeated_runs_share_layout() {
        let dir = tempdir().unwrap();
        let assets: Vec<MediaAsset> = (0..4)
            .map(|i| MediaAsset::new(i, png(dir.path(), &format!("{i}.png"))).with_duration(1.5))
            .collect();

        let engine = AssemblyEngine::new(small_config(dir.path())).unwrap();
        let a = engine.prepare(assets.clone(), "", AudioSources::default()).await.unwrap();
        let b = engine.prepare(assets, "", AudioSources::default()).await.unwrap();

        assert_eq!(a.timeline.spans(), b.timeline.spans());
        assert_eq!(a.timeline.scene_order(), vec![0, 1, 2, 3]);
        assert!(a.audio.is_silent());
    }
}
