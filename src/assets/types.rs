use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Visual asset classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Single image, animated with a procedural zoom
    Still,
    /// Video clip, looped or trimmed to the scene duration
    Motion,
}

impl AssetKind {
    pub const STILL_EXTENSIONS: &'static [&'static str] = &["jpg", "jpeg", "png", "webp", "bmp"];
    pub const MOTION_EXTENSIONS: &'static [&'static str] = &["mp4", "mov", "avi", "mkv", "webm"];

    /// Classify by file extension (case-insensitive). Unknown extensions yield `None`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();

        if Self::STILL_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Still)
        } else if Self::MOTION_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Motion)
        } else {
            None
        }
    }
}

/// One scene's visual input, as handed over by the acquisition side
///
/// Scene indexes may repeat; ties keep the order the assets were supplied in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Image or video file
    #[serde(default, alias = "path")]
    pub source_path: Option<PathBuf>,

    /// Requested on-screen time in seconds
    #[serde(default, alias = "duration")]
    pub requested_duration: Option<f64>,

    /// Narration recorded for this scene alone
    #[serde(default, alias = "voiceover_path")]
    pub narration_path: Option<PathBuf>,

    /// Short caption burned in at the bottom of the frame
    #[serde(default)]
    pub text_overlay: Option<String>,

    #[serde(default, alias = "scene")]
    pub scene_index: usize,
}

impl MediaAsset {
    pub fn new<P: Into<PathBuf>>(scene_index: usize, source_path: P) -> Self {
        Self {
            source_path: Some(source_path.into()),
            scene_index,
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.requested_duration = Some(seconds);
        self
    }

    pub fn with_narration<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.narration_path = Some(path.into());
        self
    }

    pub fn with_caption<S: Into<String>>(mut self, text: S) -> Self {
        self.text_overlay = Some(text.into());
        self
    }

    /// Kind derived from the source extension
    pub fn kind(&self) -> Option<AssetKind> {
        self.source_path.as_deref().and_then(AssetKind::from_path)
    }
}

/// Narration that decoded successfully
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNarration {
    pub path: PathBuf,
    pub duration: f64,
}

/// An asset that survived normalization, with its final on-screen duration
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    pub scene_index: usize,
    pub source_path: PathBuf,
    pub kind: AssetKind,

    /// Requested duration raised to the narration length where needed
    pub duration: f64,

    pub narration: Option<ResolvedNarration>,
    pub caption: Option<String>,
}
