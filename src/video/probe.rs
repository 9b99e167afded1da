use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Result, VideoError};
use crate::video::types::FrameGeometry;

/// Stream facts needed to plan a motion clip
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub geometry: FrameGeometry,

    /// Container duration, when ffprobe reports one
    pub duration: Option<f64>,

    pub fps: Option<f64>,
}

/// Tool presence checks and ffprobe lookups for motion sources
pub struct MediaProbe;

impl MediaProbe {
    pub fn ffmpeg_available() -> bool {
        Self::tool_available("ffmpeg")
    }

    pub fn ffprobe_available() -> bool {
        Self::tool_available("ffprobe")
    }

    fn tool_available(tool: &str) -> bool {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// First video stream's geometry, rate and container duration
    pub fn motion_info(path: &Path) -> Result<MediaInfo> {
        let output = Command::new("ffprobe")
            .args([
                "-v", "error",
                "-select_streams", "v:0",
                "-show_entries", "stream=width,height,r_frame_rate:format=duration",
                "-of", "default=noprint_wrappers=1",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| VideoError::LoadFailed {
                path: format!("{}: ffprobe failed to start: {}", path.display(), e),
            })?;

        if !output.status.success() {
            return Err(VideoError::LoadFailed {
                path: format!("{}: {}", path.display(), String::from_utf8_lossy(&output.stderr).trim()),
            }.into());
        }

        let info = Self::parse_probe_output(&String::from_utf8_lossy(&output.stdout)).map_err(|e| {
            VideoError::LoadFailed { path: format!("{}: {}", path.display(), e) }
        })?;
        debug!("Probed {:?}: {} @ {:?}fps, {:?}s", path, info.geometry, info.fps, info.duration);
        Ok(info)
    }

    /// Parse `key=value` lines as printed by `-of default=noprint_wrappers=1`
    pub(crate) fn parse_probe_output(text: &str) -> std::result::Result<MediaInfo, String> {
        let mut width = None;
        let mut height = None;
        let mut duration = None;
        let mut fps = None;

        for line in text.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            match key {
                "width" => width = value.parse::<u32>().ok(),
                "height" => height = value.parse::<u32>().ok(),
                "duration" => duration = value.parse::<f64>().ok().filter(|d| d.is_finite() && *d > 0.0),
                "r_frame_rate" => fps = parse_rate(value),
                _ => {}
            }
        }

        match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok(MediaInfo {
                geometry: FrameGeometry::new(w, h),
                duration,
                fps,
            }),
            _ => Err("no video stream with usable dimensions".to_string()),
        }
    }
}

/// `30000/1001` style rationals
fn parse_rate(value: &str) -> Option<f64> {
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num.parse::<f64>().ok()? / den
        }
        None => value.parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let text = "width=1280\nheight=720\nr_frame_rate=30000/1001\nduration=9.042000\n";
        let info = MediaProbe::parse_probe_output(text).unwrap();
        assert_eq!(info.geometry, FrameGeometry::new(1280, 720));
        assert!((info.fps.unwrap() - 29.97).abs() < 0.01);
        assert!((info.duration.unwrap() - 9.042).abs() < 1e-9);
    }

    #[test]
    fn test_missing_duration_is_none() {
        let info = MediaProbe::parse_probe_output("width=640\nheight=480\nr_frame_rate=0/0\nduration=N/A\n").unwrap();
        assert_eq!(info.duration, None);
        assert_eq!(info.fps, None);
    }

    #[test]
    fn test_audio_only_rejected() {
        assert!(MediaProbe::parse_probe_output("duration=3.0\n").is_err());
        assert!(MediaProbe::parse_probe_output("width=0\nheight=480\n").is_err());
    }
}
