use thiserror::Error;

/// Main error type for the scene compositor
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Per-asset failures. The asset is skipped, the job continues.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Scene {scene}: source missing or unreadable: {path}")]
    Missing { scene: usize, path: String },

    #[error("Scene {scene}: unsupported asset kind: {path}")]
    UnsupportedKind { scene: usize, path: String },

    #[error("Scene {scene}: invalid duration {duration}")]
    InvalidDuration { scene: usize, duration: f64 },
}

/// Caption rendering failures. The clip is kept without its caption.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("No usable caption font (tried: {tried})")]
    FontUnavailable { tried: String },

    #[error("Caption rendering failed: {reason}")]
    RenderFailed { reason: String },
}

/// Audio-specific errors. A failing layer is dropped, the others proceed.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },

    #[error("Layer gain {gain} outside [0, 2]")]
    InvalidGain { gain: f32 },
}

/// Video-specific errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to load video file: {path}")]
    LoadFailed { path: String },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Frame processing failed: {reason}")]
    FrameProcessingFailed { reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Whole-timeline failures
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("No usable media: every asset was skipped")]
    EmptyTimeline,

    #[error("Clip for scene {scene} is {got}, timeline expects {expected}")]
    GeometryMismatch {
        scene: usize,
        got: String,
        expected: String,
    },

    #[error("Job cancelled during {stage}")]
    Cancelled { stage: String },
}

/// Encode/mux failures
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("FFmpeg not found on PATH")]
    FfmpegUnavailable,

    #[error("Encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Output file error for {path}: {reason}")]
    Output { path: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error ends the job rather than a single asset or layer
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Asset(_) | Self::Overlay(_) | Self::Audio(_))
    }

    /// The "no media available" condition callers must not treat as transient
    pub fn is_no_media(&self) -> bool {
        matches!(self, Self::Composition(CompositionError::EmptyTimeline))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Composition(CompositionError::EmptyTimeline) => {
                "None of the supplied assets could be used. Check that the files exist and have a supported extension.".to_string()
            }
            Self::Export(ExportError::FfmpegUnavailable) => {
                "FFmpeg is required for rendering. Install it and make sure it is on PATH.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
