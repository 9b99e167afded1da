use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};

use image::RgbImage;
use tracing::{debug, warn};

use crate::error::{Result, VideoError};
use crate::video::canonicalizer::CropPlan;
use crate::video::motion::{MotionPlan, ZoomPath};
use crate::video::types::{Frame, FrameGeometry};

/// A decode handle yielding canonical frames one at a time
///
/// Sources never run dry: once the underlying media is exhausted the last
/// frame repeats, so a clip always fills its frame budget.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Frame>;
}

/// A canonicalized still animated along a zoom path
pub struct StillSource {
    base: RgbImage,
    zoom: Option<ZoomPath>,
    fps: f64,
    index: u64,
}

impl StillSource {
    pub fn new(base: Frame, zoom: Option<ZoomPath>, fps: f64) -> Self {
        Self { base: base.into_image(), zoom, fps, index: 0 }
    }
}

impl FrameSource for StillSource {
    fn next_frame(&mut self) -> Result<Frame> {
        let t = self.index as f64 / self.fps;
        self.index += 1;
        let image = match &self.zoom {
            Some(zoom) => zoom.apply(&self.base, t),
            None => self.base.clone(),
        };
        Ok(Frame::new(image))
    }
}

/// Running ffmpeg decoder with its stdout pipe
struct Decoder {
    child: Child,
    stdout: ChildStdout,
}

/// A motion asset decoded by an ffmpeg child into rgb24 frames
///
/// The child is started on the first frame request, so building many clips
/// does not leave many decoders idling. It is killed and reaped on drop.
pub struct MotionSource {
    path: PathBuf,
    crop: CropPlan,
    plan: MotionPlan,
    duration: f64,
    fps: f64,
    decoder: Option<Decoder>,
    exhausted: bool,
    last: Option<Frame>,
}

impl MotionSource {
    pub fn new<P: Into<PathBuf>>(path: P, crop: CropPlan, plan: MotionPlan, duration: f64, fps: f64) -> Self {
        Self {
            path: path.into(),
            crop,
            plan,
            duration,
            fps,
            decoder: None,
            exhausted: false,
            last: None,
        }
    }

    pub fn plan(&self) -> MotionPlan {
        self.plan
    }

    /// Arguments for the decoding child; audio is dropped here
    pub fn ffmpeg_args(&self) -> Vec<String> {
        self.decode_args(None)
    }

    fn decode_args(&self, max_frames: Option<u64>) -> Vec<String> {
        let mut args: Vec<String> = vec!["-v".into(), "error".into(), "-nostdin".into()];

        match self.plan {
            MotionPlan::Loop => args.extend(["-stream_loop".into(), "-1".into()]),
            MotionPlan::Trim { start_offset } => {
                args.extend(["-ss".into(), format!("{:.3}", start_offset)])
            }
            MotionPlan::Pass => {}
        }

        args.extend([
            "-i".into(),
            self.path.display().to_string(),
            "-t".into(),
            format!("{:.3}", self.duration),
            "-an".into(),
            "-vf".into(),
            format!("fps={},{}", self.fps, self.crop.ffmpeg_filter()),
        ]);
        if let Some(n) = max_frames {
            args.extend(["-frames:v".into(), n.to_string()]);
        }
        args.extend([
            "-pix_fmt".into(),
            "rgb24".into(),
            "-f".into(),
            "rawvideo".into(),
            "pipe:1".into(),
        ]);
        args
    }

    /// Decode the first frame in a throwaway child
    ///
    /// A container ffprobe can read may still hold no decodable video; this
    /// catches it while the clip can be skipped, rather than mid-export.
    pub fn verify(&self) -> Result<()> {
        let output = Command::new("ffmpeg")
            .args(self.decode_args(Some(1)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| VideoError::DecodingFailed {
                reason: format!("{}: ffmpeg failed to start: {}", self.path.display(), e),
            })?;

        let needed = self.crop.target.rgb_len();
        if !output.status.success() || output.stdout.len() < needed {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::DecodingFailed {
                reason: format!(
                    "{}: first frame not decodable ({} of {} bytes){}",
                    self.path.display(),
                    output.stdout.len(),
                    needed,
                    stderr.lines().last().map(|l| format!(": {}", l)).unwrap_or_default()
                ),
            }.into());
        }
        Ok(())
    }

    fn start(&mut self) -> Result<&mut Decoder> {
        if self.decoder.is_none() {
            debug!("Starting decoder for {:?} ({:?})", self.path, self.plan);
            let mut child = Command::new("ffmpeg")
                .args(self.ffmpeg_args())
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| VideoError::DecodingFailed {
                    reason: format!("{}: ffmpeg failed to start: {}", self.path.display(), e),
                })?;

            let stdout = match child.stdout.take() {
                Some(stdout) => stdout,
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(VideoError::DecodingFailed {
                        reason: format!("{}: decoder has no stdout", self.path.display()),
                    }.into());
                }
            };
            self.decoder = Some(Decoder { child, stdout });
        }

        self.decoder.as_mut().ok_or_else(|| {
            VideoError::DecodingFailed { reason: "decoder not running".to_string() }.into()
        })
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let geometry: FrameGeometry = self.crop.target;
        let mut buf = vec![0u8; geometry.rgb_len()];
        let path = self.path.display().to_string();
        let decoder = self.start()?;

        match decoder.stdout.read_exact(&mut buf) {
            Ok(()) => Frame::from_rgb_bytes(geometry.width, geometry.height, buf)
                .map(Some)
                .ok_or_else(|| VideoError::FrameProcessingFailed {
                    reason: format!("{}: frame buffer size mismatch", path),
                }.into()),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(VideoError::DecodingFailed { reason: format!("{}: {}", path, e) }.into()),
        }
    }

    fn stop(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            let _ = decoder.child.kill();
            let _ = decoder.child.wait();
        }
    }
}

impl FrameSource for MotionSource {
    fn next_frame(&mut self) -> Result<Frame> {
        if !self.exhausted {
            match self.read_frame()? {
                Some(frame) => {
                    self.last = Some(frame.clone());
                    return Ok(frame);
                }
                None => {
                    self.exhausted = true;
                    self.stop();
                }
            }
        }

        match &self.last {
            Some(frame) => Ok(frame.clone()),
            None => {
                warn!("{:?} produced no frames", self.path);
                Err(VideoError::DecodingFailed {
                    reason: format!("{}: no frames decoded", self.path.display()),
                }.into())
            }
        }
    }
}

impl Drop for MotionSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::motion::ZoomDirection;
    use crate::video::test_support::{dominant_channel, ffmpeg_ready, write_color_clip};

    #[test]
    fn test_still_source_never_runs_dry() {
        let base = Frame::new_filled(8, 4, [200, 100, 50]);
        let mut source = StillSource::new(base.clone(), None, 24.0);
        for _ in 0..5 {
            assert_eq!(source.next_frame().unwrap().as_bytes(), base.as_bytes());
        }
    }

    #[test]
    fn test_still_source_follows_zoom() {
        let base = Frame::new(RgbImage::from_fn(40, 20, |x, y| image::Rgb([x as u8 * 6, y as u8 * 12, 0])));
        let zoom = ZoomPath::new(ZoomDirection::Out, 1.10, 1.0);
        let mut source = StillSource::new(base.clone(), Some(zoom), 2.0);

        let first = source.next_frame().unwrap();
        let _ = source.next_frame().unwrap();
        let third = source.next_frame().unwrap();

        assert_ne!(first.as_bytes(), base.as_bytes());
        // t = 1.0 is the end of a zoom-out: full frame
        assert_eq!(third.as_bytes(), base.as_bytes());
    }

    fn crop() -> CropPlan {
        CropPlan::compute(FrameGeometry::new(1280, 720), FrameGeometry::new(1920, 1080)).unwrap()
    }

    #[test]
    fn test_loop_args() {
        let source = MotionSource::new("clip.mp4", crop(), MotionPlan::Loop, 5.0, 24.0);
        let args = source.ffmpeg_args().join(" ");
        assert!(args.contains("-stream_loop -1 -i clip.mp4 -t 5.000 -an"));
        assert!(args.contains("-vf fps=24,scale=1920:1080"));
        assert!(args.ends_with("-pix_fmt rgb24 -f rawvideo pipe:1"));
    }

    #[test]
    fn test_trim_args_seek_before_input() {
        let source = MotionSource::new("clip.mp4", crop(), MotionPlan::Trim { start_offset: 2.0 }, 5.0, 24.0);
        let args = source.ffmpeg_args().join(" ");
        assert!(args.contains("-ss 2.000 -i clip.mp4 -t 5.000"));
        assert!(!args.contains("-stream_loop"));
    }

    #[test]
    fn test_verify_decodes_a_single_frame() {
        let source = MotionSource::new("clip.mp4", crop(), MotionPlan::Trim { start_offset: 2.0 }, 5.0, 24.0);
        let args = source.decode_args(Some(1)).join(" ");
        assert!(args.contains("-ss 2.000 -i clip.mp4"));
        assert!(args.ends_with("-frames:v 1 -pix_fmt rgb24 -f rawvideo pipe:1"));
        assert!(!source.ffmpeg_args().contains(&"-frames:v".to_string()));
    }

    fn same_size() -> CropPlan {
        CropPlan::compute(FrameGeometry::new(64, 36), FrameGeometry::new(64, 36)).unwrap()
    }

    /// Drain the child, counting real frames, then keep the samples asked for
    fn decode_all(source: &mut MotionSource, keep: &[usize]) -> (usize, Vec<usize>) {
        let mut count = 0;
        let mut kept = Vec::new();
        while let Some(frame) = source.read_frame().unwrap() {
            if keep.contains(&count) {
                kept.push(dominant_channel(&frame));
            }
            count += 1;
        }
        (count, kept)
    }

    #[test]
    fn test_short_source_loops_to_fill() {
        if !ffmpeg_ready() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two_seconds.mp4");
        write_color_clip(&path, &["red", "blue"], 1.0, 64, 36, 24);

        let mut source = MotionSource::new(&path, same_size(), MotionPlan::Loop, 5.0, 24.0);
        source.verify().unwrap();
        let (count, colors) = decode_all(&mut source, &[12, 36, 60, 84, 108]);

        assert!((119..=121).contains(&count), "decoded {} frames", count);
        assert_eq!(colors, vec![0, 2, 0, 2, 0]);
    }

    #[test]
    fn test_long_source_trimmed_from_the_middle() {
        if !ffmpeg_ready() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nine_seconds.mp4");
        write_color_clip(&path, &["red", "blue", "green"], 3.0, 64, 36, 24);

        let plan = MotionPlan::for_durations(Some(9.0), 5.0);
        assert_eq!(plan, MotionPlan::Trim { start_offset: 2.0 });

        let mut source = MotionSource::new(&path, same_size(), plan, 5.0, 24.0);
        let (count, colors) = decode_all(&mut source, &[12, 60, 108]);

        assert!((119..=121).contains(&count), "decoded {} frames", count);
        // 0.5s, 2.5s and 4.5s into the clip are 2.5s, 4.5s and 6.5s of the source
        assert_eq!(colors, vec![0, 2, 1]);
    }

    #[test]
    fn test_exhausted_source_repeats_last_frame() {
        if !ffmpeg_ready() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one_second.mp4");
        write_color_clip(&path, &["green"], 1.0, 64, 36, 24);

        let mut source = MotionSource::new(&path, same_size(), MotionPlan::Pass, 1.0, 24.0);
        let frames: Vec<_> = (0..40).map(|_| source.next_frame().unwrap()).collect();
        assert!(source.exhausted);
        assert!(frames.iter().all(|f| dominant_channel(f) == 1));
    }

    #[test]
    fn test_truncated_source_fails_verification() {
        if !ffmpeg_ready() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.mp4");
        write_color_clip(&path, &["red"], 2.0, 64, 36, 24);

        // faststart puts moov first; keeping only the header leaves no samples
        let bytes = std::fs::read(&path).unwrap();
        let mdat = bytes.windows(4).position(|w| w == b"mdat").unwrap();
        std::fs::write(&path, &bytes[..mdat + 4]).unwrap();

        let source = MotionSource::new(&path, same_size(), MotionPlan::Pass, 2.0, 24.0);
        assert!(source.verify().is_err());
    }

    #[test]
    fn test_unstarted_source_drops_cleanly() {
        let source = MotionSource::new("clip.mp4", crop(), MotionPlan::Pass, 1.0, 24.0);
        assert_eq!(source.plan(), MotionPlan::Pass);
        drop(source);
    }
}
