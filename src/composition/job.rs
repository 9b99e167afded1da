use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    audio::CompositeAudio,
    composition::timeline::Timeline,
    config::OutputConfig,
    error::{CompositionError, CompositorError, Result},
    styles::{Style, StyleGrade},
};

/// Lifecycle of one assembly run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Pending,
    AssetsNormalized,
    ClipsBuilt,
    Sequenced,
    AudioMixed,
    Exported,
    Failed,
}

impl JobState {
    /// The only state a successful stage may move to
    pub fn successor(self) -> Option<JobState> {
        match self {
            JobState::Pending => Some(JobState::AssetsNormalized),
            JobState::AssetsNormalized => Some(JobState::ClipsBuilt),
            JobState::ClipsBuilt => Some(JobState::Sequenced),
            JobState::Sequenced => Some(JobState::AudioMixed),
            JobState::AudioMixed => Some(JobState::Exported),
            JobState::Exported | JobState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Exported | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Pending => "PENDING",
            JobState::AssetsNormalized => "ASSETS_NORMALIZED",
            JobState::ClipsBuilt => "CLIPS_BUILT",
            JobState::Sequenced => "SEQUENCED",
            JobState::AudioMixed => "AUDIO_MIXED",
            JobState::Exported => "EXPORTED",
            JobState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Enforces the forward-only state machine
#[derive(Debug, Clone)]
pub struct JobProgress {
    state: JobState,
}

impl JobProgress {
    pub fn new() -> Self {
        Self { state: JobState::Pending }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn advance(&mut self, next: JobState) -> Result<()> {
        if self.state.successor() != Some(next) {
            return Err(CompositorError::generic(format!(
                "illegal job transition {} -> {}",
                self.state, next
            )));
        }
        info!("Job: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Enter FAILED; terminal states are left alone
    pub fn fail(&mut self, reason: &CompositorError) {
        if !self.state.is_terminal() {
            warn!("Job failed in {}: {}", self.state, reason);
            self.state = JobState::Failed;
        }
    }

    /// Record a stage result, failing the job on error
    pub fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.fail(e);
        }
        result
    }
}

impl Default for JobProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative cancellation shared between the caller and the engine
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear a previous request so the next job can run
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(CompositionError::Cancelled { stage: stage.to_string() }.into());
        }
        Ok(())
    }
}

/// Geometry, rate and codecs every output of a job must satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct OutputContract {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub video_codec: String,
    pub audio_codec: String,
}

impl From<&OutputConfig> for OutputContract {
    fn from(config: &OutputConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            fps: config.fps,
            video_codec: config.video_codec.clone(),
            audio_codec: config.audio_codec.clone(),
        }
    }
}

/// Everything the exporter needs: built once, consumed by the export
pub struct RenderJob {
    pub timeline: Timeline,
    pub audio: CompositeAudio,
    pub contract: OutputContract,
    pub grade: StyleGrade,
    pub style: Arc<dyn Style>,
    pub progress: JobProgress,
}

impl RenderJob {
    pub fn duration(&self) -> f64 {
        self.timeline.duration()
    }

    pub fn state(&self) -> JobState {
        self.progress.state()
    }
}

impl fmt::Debug for RenderJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderJob")
            .field("timeline", &self.timeline)
            .field("audio_layers", &self.audio.layers.len())
            .field("contract", &self.contract)
            .field("grade", &self.grade)
            .field("state", &self.progress.state())
            .finish()
    }
}
