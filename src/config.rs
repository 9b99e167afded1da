use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for the scene compositor
///
/// Immutable once a job starts: every stage receives it (or a section of it)
/// by reference instead of reading global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output contract: geometry, frame rate, codecs, file naming
    pub output: OutputConfig,

    /// Asset normalization settings
    pub assets: AssetConfig,

    /// Still-image motion settings
    pub motion: MotionConfig,

    /// Audio mixing policy
    pub audio: AudioConfig,

    /// Caption rendering settings
    pub overlay: OverlayConfig,

    /// Parallelism settings
    pub processing: ProcessingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.assets.validate()?;
        self.motion.validate()?;
        self.audio.validate()?;
        self.overlay.validate()?;
        self.processing.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Output contract shared by every clip and the exporter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,

    /// Encoder passed to ffmpeg `-c:v`
    pub video_codec: String,

    /// Encoder passed to ffmpeg `-c:a`
    pub audio_codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,

    /// Directory the final file is written to
    pub output_dir: PathBuf,

    /// File name prefix; a timestamp is appended
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 24.0,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            quality: 85,
            output_dir: PathBuf::from("output"),
            file_prefix: "final_cut".to_string(),
        }
    }
}

impl OutputConfig {
    fn validate(&self) -> Result<()> {
        // yuv420p needs even dimensions
        if self.width == 0 || self.width % 2 != 0 {
            return Err(invalid("output.width", self.width).into());
        }
        if self.height == 0 || self.height % 2 != 0 {
            return Err(invalid("output.height", self.height).into());
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(invalid("output.fps", self.fps).into());
        }
        if self.quality > 100 {
            return Err(invalid("output.quality", self.quality).into());
        }
        if self.file_prefix.is_empty() {
            return Err(invalid("output.file_prefix", "\"\"").into());
        }
        Ok(())
    }
}

/// Asset normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Scene duration used when an asset does not request one (seconds)
    pub default_scene_duration: f64,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            default_scene_duration: 5.0,
        }
    }
}

impl AssetConfig {
    fn validate(&self) -> Result<()> {
        if !(self.default_scene_duration.is_finite() && self.default_scene_duration > 0.0) {
            return Err(invalid("assets.default_scene_duration", self.default_scene_duration).into());
        }
        Ok(())
    }
}

/// Ken Burns configuration for still assets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Scale at the zoomed end of the move (1.0 is the other end)
    pub zoom_max: f64,

    /// Fixed seed for the zoom-direction choice. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            zoom_max: 1.10,
            seed: None,
        }
    }
}

impl MotionConfig {
    fn validate(&self) -> Result<()> {
        if !(self.zoom_max.is_finite() && (1.0..=2.0).contains(&self.zoom_max)) {
            return Err(invalid("motion.zoom_max", self.zoom_max).into());
        }
        Ok(())
    }
}

/// What to do with a music bed shorter than the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicFill {
    /// Play once; trailing silence after the fade-out
    LeaveShort,
    /// Repeat with a crossfade until the timeline is covered
    Loop,
}

/// Audio mixing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate of the composite track (Hz)
    pub sample_rate: u32,

    /// Channel count of the composite track
    pub channels: u16,

    /// Music gain when the job has no narration
    pub music_gain: f32,

    /// Music gain when any narration layer is present
    pub ducked_music_gain: f32,

    pub music_fade_in: f64,
    pub music_fade_out: f64,

    pub music_fill: MusicFill,

    /// Crossfade length used by `MusicFill::Loop` (seconds)
    pub loop_crossfade: f64,

    pub ambient_gain: f32,

    /// Gain for the job-wide narration track
    pub narration_gain: f32,

    /// Multiplier applied to narration attached to a single scene
    pub scene_narration_boost: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            music_gain: 0.6,
            ducked_music_gain: 0.25,
            music_fade_in: 2.0,
            music_fade_out: 2.0,
            music_fill: MusicFill::LeaveShort,
            loop_crossfade: 1.0,
            ambient_gain: 0.6,
            narration_gain: 1.0,
            scene_narration_boost: 1.5,
        }
    }
}

impl AudioConfig {
    /// Gain applied to per-scene narration
    pub fn scene_narration_gain(&self) -> f32 {
        self.narration_gain * self.scene_narration_boost
    }

    fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000 {
            return Err(invalid("audio.sample_rate", self.sample_rate).into());
        }
        if !(1..=2).contains(&self.channels) {
            return Err(invalid("audio.channels", self.channels).into());
        }

        let gains = [
            ("audio.music_gain", self.music_gain),
            ("audio.ducked_music_gain", self.ducked_music_gain),
            ("audio.ambient_gain", self.ambient_gain),
            ("audio.narration_gain", self.narration_gain),
            ("audio.scene_narration_gain", self.scene_narration_gain()),
        ];
        for (key, gain) in gains {
            if !(0.0..=2.0).contains(&gain) {
                return Err(invalid(key, gain).into());
            }
        }

        for (key, secs) in [
            ("audio.music_fade_in", self.music_fade_in),
            ("audio.music_fade_out", self.music_fade_out),
            ("audio.loop_crossfade", self.loop_crossfade),
        ] {
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(invalid(key, secs).into());
            }
        }

        Ok(())
    }
}

/// Caption configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Font file. When unset, common system locations are tried.
    pub font_path: Option<PathBuf>,

    /// Glyph size in pixels
    pub font_size: f32,

    /// Distance between the caption's bottom edge and the frame bottom
    pub bottom_margin: u32,

    /// Horizontal margin used for word wrapping
    pub side_margin: u32,

    pub shadow_offset: u32,
    pub shadow_alpha: u8,

    /// Captions shorter than this (in characters) are ignored
    pub min_chars: usize,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 80.0,
            bottom_margin: 150,
            side_margin: 80,
            shadow_offset: 4,
            shadow_alpha: 180,
            min_chars: 2,
        }
    }
}

impl OverlayConfig {
    fn validate(&self) -> Result<()> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(invalid("overlay.font_size", self.font_size).into());
        }
        Ok(())
    }
}

/// Parallelism configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Worker threads for per-asset clip building
    pub threads: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
        }
    }
}

impl ProcessingConfig {
    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(invalid("processing.threads", self.threads).into());
        }
        Ok(())
    }
}
