use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::audio::types::AudioData;
use crate::error::{AudioError, Result};

/// Audio file loader supporting multiple formats
pub struct AudioLoader;

impl AudioLoader {
    /// Load and fully decode an audio file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref();
        match Container::of(path)? {
            Container::Wav => Self::load_wav(path),
            Container::Compressed => Self::load_with_symphonia(path),
        }
    }

    /// Duration in seconds, read from headers when the container exposes it
    pub fn probe_duration<P: AsRef<Path>>(path: P) -> Result<f64> {
        let path = path.as_ref();
        match Container::of(path)? {
            Container::Wav => {
                let reader = hound::WavReader::open(path).map_err(|_| Self::load_failed(path))?;
                let rate = reader.spec().sample_rate;
                if rate == 0 {
                    return Err(Self::load_failed(path));
                }
                Ok(reader.duration() as f64 / rate as f64)
            }
            Container::Compressed => {
                let format = Self::open_format(path)?;
                let header_duration = format
                    .default_track()
                    .and_then(|t| Some((t.codec_params.n_frames?, t.codec_params.sample_rate?)))
                    .filter(|&(_, rate)| rate > 0)
                    .map(|(frames, rate)| frames as f64 / rate as f64);

                match header_duration {
                    Some(d) => Ok(d),
                    None => {
                        debug!("No duration header in {:?}, decoding to measure", path);
                        Ok(Self::load_with_symphonia(path)?.duration)
                    }
                }
            }
        }
    }

    /// PCM WAV through hound; integer samples are scaled to [-1, 1)
    fn load_wav(path: &Path) -> Result<AudioData> {
        let reader = hound::WavReader::open(path).map_err(|_| Self::load_failed(path))?;
        let spec = reader.spec();

        let samples: std::result::Result<Vec<f32>, hound::Error> = match spec.sample_format {
            hound::SampleFormat::Float => reader.into_samples::<f32>().collect(),
            hound::SampleFormat::Int => {
                let scale = int_scale(spec.bits_per_sample);
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect()
            }
        };
        let samples = samples.map_err(|_| Self::load_failed(path))?;

        Ok(AudioData::from_samples(samples, spec.sample_rate, spec.channels, path.to_path_buf()))
    }

    fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
        let file = File::open(path).map_err(|_| Self::load_failed(path))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|_| Self::load_failed(path))?;

        Ok(probed.format)
    }

    /// Load compressed formats using Symphonia
    fn load_with_symphonia(path: &Path) -> Result<AudioData> {
        let mut format = Self::open_format(path)?;

        // First track with a decodable codec
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Self::load_failed(path))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|_| Self::load_failed(path))?;

        let mut samples = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                // End of stream surfaces as an IO error
                Err(_) => break,
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate.get_or_insert(spec.rate);
                    channels.get_or_insert(spec.channels.count() as u16);

                    let needed = decoded.capacity();
                    // SampleBuffer capacity counts interleaved samples, not frames
                    let needed_samples = needed * spec.channels.count();
                    if sample_buf.as_ref().map_or(true, |b| b.capacity() < needed_samples) {
                        sample_buf = Some(SampleBuffer::new(needed as u64, spec));
                    }
                    if let Some(buf) = sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        samples.extend_from_slice(buf.samples());
                    }
                }
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(_) => break,
            }
        }

        let (sample_rate, channels) = match (sample_rate, channels) {
            (Some(rate), Some(ch)) if rate > 0 && ch > 0 => (rate, ch),
            _ => {
                return Err(AudioError::InvalidParameters {
                    details: format!("{}: no sample rate or channel layout", path.display()),
                }.into())
            }
        };

        Ok(AudioData::from_samples(samples, sample_rate, channels, path.to_path_buf()))
    }

    fn load_failed(path: &Path) -> crate::error::CompositorError {
        AudioError::LoadFailed { path: path.display().to_string() }.into()
    }
}

/// How a file gets decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Wav,
    Compressed,
}

impl Container {
    const COMPRESSED: &'static [&'static str] = &["mp3", "flac", "ogg", "m4a", "aac"];

    fn of(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if ext == "wav" {
            Ok(Container::Wav)
        } else if Self::COMPRESSED.contains(&ext.as_str()) {
            Ok(Container::Compressed)
        } else {
            Err(AudioError::UnsupportedFormat { format: ext }.into())
        }
    }
}

/// Full-scale value of signed integer PCM (hound re-centres 8-bit samples)
fn int_scale(bits: u16) -> f32 {
    match bits {
        8 => 128.0,
        24 => 8_388_608.0,
        32 => 2_147_483_648.0,
        _ => 32_768.0,
    }
}
