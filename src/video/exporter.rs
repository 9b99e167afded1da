use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::{
    composition::job::{CancellationFlag, RenderJob},
    config::OutputConfig,
    error::{ExportError, Result},
    video::probe::MediaProbe,
};

/// Check for cancellation every this many frames
const CANCEL_CHECK_INTERVAL: u64 = 24;

/// Collision-free, timestamped output names
#[derive(Debug, Clone)]
pub struct OutputNamer {
    dir: PathBuf,
    prefix: String,
}

impl OutputNamer {
    pub fn new<P: Into<PathBuf>>(dir: P, prefix: &str) -> Self {
        Self { dir: dir.into(), prefix: prefix.to_string() }
    }

    /// `<prefix>_<YYYYmmdd_HHMMSS>.mp4`, or with `_1`, `_2`, ... appended
    /// when that name (or its partial file) is already taken
    pub fn name_for(&self, now: DateTime<Local>) -> PathBuf {
        let stem = format!("{}_{}", self.prefix, now.format("%Y%m%d_%H%M%S"));
        let mut candidate = self.dir.join(format!("{}.mp4", stem));
        let mut n = 1;
        while candidate.exists() || partial_path(&candidate).exists() {
            candidate = self.dir.join(format!("{}_{}.mp4", stem, n));
            n += 1;
        }
        candidate
    }
}

/// Sibling path the encoder writes to before the final rename
pub fn partial_path(final_path: &Path) -> PathBuf {
    let stem = final_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    final_path.with_file_name(format!("{}.partial.mp4", stem))
}

/// Map a 0-100 quality setting onto x264's CRF scale (lower is better)
pub fn quality_to_crf(quality: u8) -> u8 {
    (51 - ((quality.min(100) as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
}

/// Encoder child plus the partial file it is writing
///
/// Until `commit` succeeds, dropping the session kills the encoder and
/// removes the partial file.
struct EncodeSession {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    partial: PathBuf,
    log: PathBuf,
}

impl EncodeSession {
    fn write_frame(&mut self, bytes: &[u8]) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| ExportError::EncodingFailed {
            reason: "encoder input already closed".to_string(),
        })?;
        stdin.write_all(bytes).map_err(|e| ExportError::EncodingFailed {
            reason: format!("encoder stopped accepting frames: {}; {}", e, self.log_tail()),
        })?;
        Ok(())
    }

    /// Close the input, wait for the encoder and move the file into place
    fn commit(mut self, final_path: &Path) -> Result<()> {
        drop(self.stdin.take());
        let status = match self.child.take() {
            Some(mut child) => child.wait().map_err(|e| ExportError::EncodingFailed {
                reason: format!("waiting for encoder: {}", e),
            })?,
            None => {
                return Err(ExportError::EncodingFailed {
                    reason: "encoder not running".to_string(),
                }.into())
            }
        };

        if !status.success() {
            return Err(ExportError::EncodingFailed {
                reason: format!("ffmpeg exited with {}: {}", status, self.log_tail()),
            }.into());
        }

        fs::rename(&self.partial, final_path).map_err(|e| ExportError::Output {
            path: final_path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn log_tail(&self) -> String {
        fs::read_to_string(&self.log)
            .map(|log| {
                let lines: Vec<&str> = log.lines().collect();
                lines[lines.len().saturating_sub(5)..].join(" | ")
            })
            .unwrap_or_default()
    }
}

impl Drop for EncodeSession {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if self.partial.exists() {
            if let Err(e) = fs::remove_file(&self.partial) {
                warn!("Could not remove partial output {:?}: {}", self.partial, e);
            }
        }
    }
}

/// Encodes a finished render job to a single mp4 through an ffmpeg child
pub struct Exporter<'a> {
    config: &'a OutputConfig,
}

impl<'a> Exporter<'a> {
    pub fn new(config: &'a OutputConfig) -> Self {
        Self { config }
    }

    /// ffmpeg arguments: raw rgb24 frames on stdin, optional WAV, one mp4 out
    pub fn ffmpeg_args(&self, audio: Option<&Path>, duration: f64, output: &Path) -> Vec<String> {
        let c = self.config;
        let mut args: Vec<String> = vec![
            "-y".into(), "-v".into(), "error".into(),
            "-f".into(), "rawvideo".into(),
            "-pix_fmt".into(), "rgb24".into(),
            "-s".into(), format!("{}x{}", c.width, c.height),
            "-r".into(), c.fps.to_string(),
            "-i".into(), "pipe:0".into(),
        ];

        if let Some(audio) = audio {
            args.extend(["-i".into(), audio.display().to_string()]);
            args.extend(["-map".into(), "0:v:0".into(), "-map".into(), "1:a:0".into()]);
        }

        args.extend([
            "-c:v".into(), c.video_codec.clone(),
            "-pix_fmt".into(), "yuv420p".into(),
            "-crf".into(), quality_to_crf(c.quality).to_string(),
        ]);

        match audio {
            Some(_) => args.extend(["-c:a".into(), c.audio_codec.clone(), "-b:a".into(), "192k".into()]),
            None => args.push("-an".into()),
        }

        args.extend([
            "-t".into(), format!("{:.3}", duration),
            "-movflags".into(), "+faststart".into(),
            "-f".into(), "mp4".into(),
            output.display().to_string(),
        ]);
        args
    }

    /// Render every clip, mux the composite audio, and return the final path
    ///
    /// Clips are consumed in order and dropped as soon as they are rendered,
    /// releasing their decoders. Nothing is left at the final path unless the
    /// encode succeeded.
    pub fn export(&self, job: RenderJob, cancel: &CancellationFlag) -> Result<PathBuf> {
        if !MediaProbe::ffmpeg_available() {
            return Err(ExportError::FfmpegUnavailable.into());
        }

        fs::create_dir_all(&self.config.output_dir).map_err(|e| ExportError::Output {
            path: self.config.output_dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let final_path = OutputNamer::new(&self.config.output_dir, &self.config.file_prefix)
            .name_for(Local::now());
        let partial = partial_path(&final_path);
        let scratch = tempfile::Builder::new().prefix("scene-compositor-").tempdir()?;

        let audio_path = match &job.audio.track {
            Some(track) => {
                let path = scratch.path().join("composite.wav");
                track.write_wav(&path)?;
                Some(path)
            }
            None => None,
        };

        // Length of the video actually written, within a frame of the timeline
        let duration = job.timeline.total_frames() as f64 / job.timeline.fps();
        let args = self.ffmpeg_args(audio_path.as_deref(), duration, &partial);
        debug!("ffmpeg {}", args.join(" "));

        let log = scratch.path().join("ffmpeg.log");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::from(File::create(&log)?))
            .spawn()
            .map_err(|e| ExportError::EncodingFailed {
                reason: format!("ffmpeg failed to start: {}", e),
            })?;
        let stdin = child.stdin.take();
        let mut session = EncodeSession { child: Some(child), stdin, partial, log };

        info!("🎞️  Encoding {:.2}s ({} frames) to {:?}", duration, job.timeline.total_frames(), final_path);

        let style = job.style;
        let mut written = 0u64;
        for (mut clip, span) in job.timeline.into_clips() {
            debug!("Rendering scene {} ({} frames)", span.scene_index, span.frame_count);
            for _ in 0..span.frame_count {
                if written % CANCEL_CHECK_INTERVAL == 0 {
                    cancel.check("export")?;
                }
                let frame = clip.render_frame(style.as_ref())?;
                session.write_frame(frame.as_bytes())?;
                written += 1;
            }
        }

        cancel.check("export")?;
        session.commit(&final_path)?;
        info!("✅ Wrote {:?} ({} frames)", final_path, written);
        Ok(final_path)
    }
}
