//! Generated motion fixtures for tests that need a real ffmpeg

use std::path::Path;
use std::process::{Command, Stdio};

use crate::video::probe::MediaProbe;
use crate::video::types::Frame;

/// Tests that decode or encode skip themselves when this is false
pub fn ffmpeg_ready() -> bool {
    MediaProbe::ffmpeg_available() && MediaProbe::ffprobe_available()
}

/// One mp4 made of solid-colour segments, `secs` each, in order
pub fn write_color_clip(path: &Path, colors: &[&str], secs: f64, width: u32, height: u32, fps: u32) {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-v", "error", "-nostdin"]);
    for color in colors {
        cmd.args([
            "-f",
            "lavfi",
            "-i",
            &format!("color=c={}:s={}x{}:r={}:d={}", color, width, height, fps, secs),
        ]);
    }
    let inputs: String = (0..colors.len()).map(|i| format!("[{}:v]", i)).collect();
    cmd.args([
        "-filter_complex",
        &format!("{}concat=n={}:v=1:a=0[v]", inputs, colors.len()),
        "-map",
        "[v]",
        "-c:v",
        "mpeg4",
        "-q:v",
        "2",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ]);
    cmd.arg(path);

    let status = cmd.stdout(Stdio::null()).stderr(Stdio::null()).status().unwrap();
    assert!(status.success(), "could not generate {:?}", path);
}

/// Index (0 = red, 1 = green, 2 = blue) of the strongest channel at the centre
pub fn dominant_channel(frame: &Frame) -> usize {
    let px = frame.get_pixel(frame.width() / 2, frame.height() / 2);
    (0..3).max_by_key(|&c| px[c]).unwrap_or(0)
}
