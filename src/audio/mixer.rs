use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    audio::{
        loader::AudioLoader,
        types::{AudioData, AudioLayer, LayerKind},
    },
    config::{AudioConfig, MusicFill},
    error::Result,
};

/// Job-level audio inputs
#[derive(Debug, Clone, Default)]
pub struct AudioSources {
    /// Background music bed
    pub music: Option<PathBuf>,

    /// Ambient beds and sound effects, all starting at zero
    pub ambient: Vec<PathBuf>,

    /// One narration track spanning the whole job
    pub narration: Option<PathBuf>,
}

/// Narration pinned to one scene of the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNarration {
    pub scene_index: usize,
    pub path: PathBuf,

    /// Scene start on the timeline (seconds)
    pub offset: f64,
}

/// The mixer's output: the layers that made it in and their sum
#[derive(Debug, Clone)]
pub struct CompositeAudio {
    pub layers: Vec<AudioLayer>,

    /// `None` when no layer survived; the video is then rendered silent
    pub track: Option<AudioData>,

    pub duration: f64,
}

impl CompositeAudio {
    pub fn is_silent(&self) -> bool {
        self.track.is_none()
    }

    pub fn layers_of(&self, kind: LayerKind) -> impl Iterator<Item = &AudioLayer> {
        self.layers.iter().filter(move |l| l.kind == kind)
    }
}

/// Decoded layer ready for summing
struct OpenLayer {
    layer: AudioLayer,
    data: AudioData,
    looped: bool,
}

/// Combines music, ambient and narration layers into one composite track
///
/// Gains, fades and truncation are fixed by [`AudioConfig`]. A layer whose
/// source cannot be decoded is dropped with a warning; the rest still mix.
pub struct AudioMixer<'a> {
    config: &'a AudioConfig,
}

impl<'a> AudioMixer<'a> {
    pub fn new(config: &'a AudioConfig) -> Self {
        Self { config }
    }

    /// Build the composite for a timeline of `total` seconds
    pub fn mix(
        &self,
        sources: &AudioSources,
        scene_narrations: &[SceneNarration],
        total: f64,
    ) -> Result<CompositeAudio> {
        info!("Mixing audio for {:.2}s timeline", total);
        let mut open = Vec::new();

        // Narration first: its presence decides the music level
        if let Some(path) = &sources.narration {
            open.extend(self.open(LayerKind::Narration, path, self.config.narration_gain, 0.0, total));
        }
        for scene in scene_narrations {
            open.extend(self.open(
                LayerKind::Narration,
                &scene.path,
                self.config.scene_narration_gain(),
                scene.offset,
                total,
            ));
        }

        let has_narration = !open.is_empty();

        if let Some(path) = &sources.music {
            let gain = self.music_gain(has_narration);
            if let Some(mut music) = self.open(LayerKind::Music, path, gain, 0.0, total) {
                if self.config.music_fill == MusicFill::Loop && music.layer.source_duration < total {
                    music.layer.duration = total;
                    music.looped = true;
                } else if music.layer.source_duration < total {
                    debug!("Music is {:.2}s short of the timeline; leaving trailing silence",
                           total - music.layer.source_duration);
                }
                music.layer = music
                    .layer
                    .with_fades(self.config.music_fade_in, self.config.music_fade_out);
                info!("   Music at gain {:.2}{}", gain, if has_narration { " (ducked)" } else { "" });
                open.push(music);
            }
        }

        for path in &sources.ambient {
            open.extend(self.open(LayerKind::Ambient, path, self.config.ambient_gain, 0.0, total));
        }

        let track = if open.is_empty() {
            info!("   No audio layers; output will be silent");
            None
        } else {
            Some(self.render(&open, total))
        };

        Ok(CompositeAudio {
            layers: open.into_iter().map(|o| o.layer).collect(),
            track,
            duration: total,
        })
    }

    /// Music level under the ducking policy
    pub fn music_gain(&self, has_narration: bool) -> f32 {
        if has_narration {
            self.config.ducked_music_gain
        } else {
            self.config.music_gain
        }
    }

    fn open(&self, kind: LayerKind, path: &Path, gain: f32, offset: f64, total: f64) -> Option<OpenLayer> {
        let opened = AudioLoader::load(path)
            .and_then(|data| data.conform(self.config.sample_rate, self.config.channels))
            .and_then(|data| {
                let layer = AudioLayer::new(kind, path, gain, data.duration)?
                    .with_offset(offset)
                    .truncated_to(total);
                Ok(OpenLayer { layer, data, looped: false })
            });

        match opened {
            Ok(open) => {
                debug!("   {:?} layer {:?}: {:.2}s at {:.2}s, gain {:.2}",
                       kind, path, open.layer.duration, offset, gain);
                Some(open)
            }
            Err(e) => {
                warn!("Dropping {:?} layer {:?}: {}", kind, path, e);
                None
            }
        }
    }

    fn render(&self, layers: &[OpenLayer], total: f64) -> AudioData {
        let rate = self.config.sample_rate as f64;
        let channels = self.config.channels as usize;
        let total_frames = (total * rate).round() as usize;
        let mut out = vec![0.0f32; total_frames * channels];

        for open in layers {
            let layer = &open.layer;
            let start = (layer.offset * rate).round() as usize;
            if start >= total_frames {
                continue;
            }
            let played = ((layer.duration * rate).round() as usize).min(total_frames - start);
            let source_frames = open.data.frame_count();
            let crossfade = (self.config.loop_crossfade * rate).round() as usize;

            for f in 0..played {
                let env = layer.envelope(f as f64 / rate);
                if env == 0.0 {
                    continue;
                }
                let base = (start + f) * channels;
                for c in 0..channels {
                    let sample = if open.looped {
                        looped_sample(&open.data, f, c, crossfade)
                    } else if f < source_frames {
                        open.data.samples[f * channels + c]
                    } else {
                        0.0
                    };
                    out[base + c] += sample * env;
                }
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        AudioData::from_samples(out, self.config.sample_rate, self.config.channels, PathBuf::from("composite"))
    }
}

/// Sample of a source repeated end to end, each repeat crossfading into the next
fn looped_sample(data: &AudioData, frame: usize, channel: usize, crossfade: usize) -> f32 {
    let n = data.frame_count();
    if n == 0 {
        return 0.0;
    }
    let channels = data.channels as usize;
    let crossfade = crossfade.min(n / 2);
    let period = n - crossfade;
    let at = |i: usize| data.samples[i * channels + channel];

    let repeat = frame / period;
    let local = frame % period;
    if repeat > 0 && local < crossfade {
        let w = local as f32 / crossfade as f32;
        at(local) * w + at(local + period) * (1.0 - w)
    } else {
        at(local)
    }
}
