//! WAV fixtures shared by the unit tests

use std::path::Path;

/// 440 Hz sine at half scale, 16-bit
pub fn write_tone_wav(path: &Path, secs: f64, sample_rate: u32, channels: u16) {
    write_wav(path, secs, sample_rate, channels, |i| {
        let t = i as f64 / sample_rate as f64;
        (0.5 * (2.0 * std::f64::consts::PI * 440.0 * t).sin()) as f32
    });
}

/// Every sample set to `value`, 16-bit
pub fn write_constant_wav(path: &Path, secs: f64, sample_rate: u32, channels: u16, value: f32) {
    write_wav(path, secs, sample_rate, channels, |_| value);
}

fn write_wav(path: &Path, secs: f64, sample_rate: u32, channels: u16, sample: impl Fn(usize) -> f32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = (secs * sample_rate as f64).round() as usize;
    for i in 0..frames {
        let value = (sample(i).clamp(-1.0, 1.0) * 32767.0).round() as i16;
        for _ in 0..channels {
            writer.write_sample(value).unwrap();
        }
    }
    writer.finalize().unwrap();
}
