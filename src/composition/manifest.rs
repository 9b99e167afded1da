use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    assets::MediaAsset,
    audio::AudioSources,
    error::{ConfigError, Result},
};

/// A job description read from TOML
///
/// ```toml
/// style = "film noir"
/// music = "audio/bed.mp3"
/// ambient = ["audio/rain.wav"]
///
/// [[assets]]
/// scene = 1
/// path = "shots/harbour.jpg"
/// duration = 4.0
/// text_overlay = "Dawn"
/// ```
///
/// Relative paths are resolved against the manifest's own directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobManifest {
    /// Free-text style tag, classified once for the whole job
    pub style: String,

    pub music: Option<PathBuf>,
    pub ambient: Vec<PathBuf>,

    /// Job-wide narration track
    pub narration: Option<PathBuf>,

    pub assets: Vec<MediaAsset>,
}

impl JobManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let mut manifest: JobManifest = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;

        if let Some(base) = path.parent() {
            manifest.resolve_relative_to(base);
        }
        Ok(manifest)
    }

    /// Anchor every relative path at `base`
    pub fn resolve_relative_to(&mut self, base: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        self.music.iter_mut().for_each(anchor);
        self.ambient.iter_mut().for_each(anchor);
        self.narration.iter_mut().for_each(anchor);
        for asset in &mut self.assets {
            asset.source_path.iter_mut().for_each(anchor);
            asset.narration_path.iter_mut().for_each(anchor);
        }
    }

    pub fn audio_sources(&self) -> AudioSources {
        AudioSources {
            music: self.music.clone(),
            ambient: self.ambient.clone(),
            narration: self.narration.clone(),
        }
    }
}
