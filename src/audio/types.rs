use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AudioError, Result};

/// Decoded audio with metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples (interleaved for stereo, mono for single channel)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Original file path
    pub file_path: PathBuf,
}

impl AudioData {
    /// Build from interleaved samples, deriving the duration
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, channels: u16, file_path: PathBuf) -> Self {
        let duration = if sample_rate == 0 || channels == 0 {
            0.0
        } else {
            samples.len() as f64 / (sample_rate as f64 * channels as f64)
        };
        Self { samples, sample_rate, channels, duration, file_path }
    }

    /// Number of sample frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Get samples for a specific channel (0-based)
    pub fn channel_samples(&self, channel: usize) -> Vec<f32> {
        if self.channels == 1 || channel >= self.channels as usize {
            return self.samples.clone();
        }

        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Get mono mix of all channels
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks(self.channels as usize)
            .map(|chunk| chunk.iter().sum::<f32>() / self.channels as f32)
            .collect()
    }

    /// Convert to the given sample rate and channel layout
    ///
    /// Channels are remapped first (mono is duplicated, extra channels beyond
    /// stereo are dropped), then every channel is linearly resampled.
    pub fn conform(&self, sample_rate: u32, channels: u16) -> Result<AudioData> {
        if sample_rate == 0 || channels == 0 || channels > 2 {
            return Err(AudioError::InvalidParameters {
                details: format!("cannot conform to {} Hz / {} channels", sample_rate, channels),
            }.into());
        }
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(AudioError::InvalidParameters {
                details: format!("{} has no sample rate or channels", self.file_path.display()),
            }.into());
        }

        let planes: Vec<Vec<f32>> = match (self.channels, channels) {
            (_, 1) => vec![self.mono_samples()],
            (1, _) => {
                let mono = self.samples.clone();
                vec![mono.clone(), mono]
            }
            (_, _) => vec![self.channel_samples(0), self.channel_samples(1)],
        };

        let planes: Vec<Vec<f32>> = if self.sample_rate == sample_rate {
            planes
        } else {
            planes
                .iter()
                .map(|plane| resample_linear(plane, self.sample_rate, sample_rate))
                .collect()
        };

        let frames = planes.first().map(Vec::len).unwrap_or(0);
        let mut samples = Vec::with_capacity(frames * channels as usize);
        for i in 0..frames {
            for plane in &planes {
                samples.push(plane[i]);
            }
        }

        Ok(AudioData::from_samples(samples, sample_rate, channels, self.file_path.clone()))
    }

    /// Write as a 32-bit float WAV file
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let wav_error = |e: hound::Error| AudioError::InvalidParameters {
            details: format!("writing {}: {}", path.display(), e),
        };

        let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error)?;
        for &sample in &self.samples {
            writer.write_sample(sample).map_err(wav_error)?;
        }
        writer.finalize().map_err(wav_error)?;
        Ok(())
    }
}

fn resample_linear(input: &[f32], from: u32, to: u32) -> Vec<f32> {
    if input.is_empty() {
        return Vec::new();
    }

    let out_len = ((input.len() as u64 * to as u64) / from as u64).max(1) as usize;
    let step = from as f64 / to as f64;
    let last = input.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos.floor() as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            input[idx] * (1.0 - frac) + input[next] * frac
        })
        .collect()
}

/// The three layer kinds the mixer knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Music,
    Ambient,
    Narration,
}

/// One source placed on the composite track
#[derive(Debug, Clone, PartialEq)]
pub struct AudioLayer {
    pub kind: LayerKind,
    pub source_path: PathBuf,

    /// Linear gain in [0, 2]
    pub gain: f32,

    pub fade_in: f64,
    pub fade_out: f64,

    /// Start position on the timeline (seconds)
    pub offset: f64,

    /// Length actually played after truncation or looping (seconds)
    pub duration: f64,

    /// Length of the decoded source (seconds)
    pub source_duration: f64,
}

impl AudioLayer {
    pub const MAX_GAIN: f32 = 2.0;

    pub fn new<P: Into<PathBuf>>(kind: LayerKind, source_path: P, gain: f32, source_duration: f64) -> Result<Self> {
        if !(0.0..=Self::MAX_GAIN).contains(&gain) {
            return Err(AudioError::InvalidGain { gain }.into());
        }

        Ok(Self {
            kind,
            source_path: source_path.into(),
            gain,
            fade_in: 0.0,
            fade_out: 0.0,
            offset: 0.0,
            duration: source_duration,
            source_duration,
        })
    }

    pub fn with_fades(mut self, fade_in: f64, fade_out: f64) -> Self {
        self.fade_in = fade_in.max(0.0);
        self.fade_out = fade_out.max(0.0);
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset.max(0.0);
        self
    }

    /// Cut the layer so it ends no later than `total` on the timeline
    pub fn truncated_to(mut self, total: f64) -> Self {
        self.duration = self.duration.min((total - self.offset).max(0.0));
        self
    }

    /// Gain multiplier `t` seconds into the layer (fades included)
    pub fn envelope(&self, t: f64) -> f32 {
        if t < 0.0 || t >= self.duration {
            return 0.0;
        }

        let mut factor = 1.0f64;
        if self.fade_in > 0.0 {
            factor = factor.min(t / self.fade_in);
        }
        if self.fade_out > 0.0 {
            factor = factor.min((self.duration - t) / self.fade_out);
        }
        self.gain * factor.clamp(0.0, 1.0) as f32
    }
}
