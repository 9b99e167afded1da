//! End-to-end runs of the engine up to the export boundary

use std::path::{Path, PathBuf};

use scene_compositor::{
    audio::LayerKind,
    composition::JobState,
    styles::StyleGrade,
    AssemblyEngine, AudioSources, Config, MediaAsset,
};
use tempfile::{tempdir, TempDir};

const RATE: u32 = 8000;

fn small_config(out: &Path) -> Config {
    let mut config = Config::default();
    config.output.width = 64;
    config.output.height = 36;
    config.output.output_dir = out.join("renders");
    config.motion.seed = Some(42);
    config.audio.sample_rate = RATE;
    config.processing.threads = 2;
    config
}

fn png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 3) as u8, (y * 5) as u8, 120])
    })
    .save(&path)
    .unwrap();
    path
}

fn wav(dir: &Path, name: &str, secs: f64) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..(secs * RATE as f64) as usize * 2 {
        writer.write_sample(4000i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn engine(dir: &TempDir) -> AssemblyEngine {
    AssemblyEngine::new(small_config(dir.path())).unwrap()
}

#[tokio::test]
async fn three_stills_with_music_run_fifteen_seconds() {
    let dir = tempdir().unwrap();
    let assets = (1..=3)
        .map(|i| {
            MediaAsset::new(i, png(dir.path(), &format!("s{i}.png"), 120, 90)).with_duration(5.0)
        })
        .collect();
    let audio = AudioSources {
        music: Some(wav(dir.path(), "bed.wav", 20.0)),
        ..Default::default()
    };

    let job = engine(&dir).prepare(assets, "cinematic", audio).await.unwrap();

    assert_eq!(job.state(), JobState::AudioMixed);
    assert_eq!(job.timeline.scene_order(), vec![1, 2, 3]);
    assert!((job.duration() - 15.0).abs() < 1e-9);

    let music: Vec<_> = job.audio.layers_of(LayerKind::Music).collect();
    assert_eq!(music.len(), 1);
    assert_eq!(music[0].gain, 0.6);
    assert_eq!(music[0].duration, 15.0);
    assert_eq!(job.audio.duration, 15.0);
}

#[tokio::test]
async fn narration_extends_scene_and_ducks_music() {
    let dir = tempdir().unwrap();
    let asset = MediaAsset::new(0, png(dir.path(), "s.png", 80, 80))
        .with_duration(3.0)
        .with_narration(wav(dir.path(), "vo.wav", 7.0));
    let audio = AudioSources {
        music: Some(wav(dir.path(), "bed.wav", 10.0)),
        ..Default::default()
    };

    let job = engine(&dir).prepare(vec![asset], "", audio).await.unwrap();

    assert!((job.duration() - 7.0).abs() < 1e-6);
    assert_eq!(job.timeline.total_frames(), 7 * 24);

    let narration: Vec<_> = job.audio.layers_of(LayerKind::Narration).collect();
    assert_eq!(narration.len(), 1);
    assert_eq!(narration[0].gain, 1.5);
    assert_eq!(narration[0].offset, 0.0);

    let music = job.audio.layers_of(LayerKind::Music).next().unwrap();
    assert_eq!(music.gain, 0.25);
}

#[tokio::test]
async fn missing_asset_is_skipped_and_order_kept() {
    let dir = tempdir().unwrap();
    let assets = vec![
        MediaAsset::new(4, png(dir.path(), "d.png", 64, 36)).with_duration(1.0),
        MediaAsset::new(1, png(dir.path(), "a.png", 64, 36)).with_duration(1.0),
        MediaAsset::new(2, dir.path().join("missing.png")).with_duration(1.0),
        MediaAsset::new(3, png(dir.path(), "c.png", 64, 36)).with_duration(1.0),
    ];

    let job = engine(&dir)
        .prepare(assets, "noir", AudioSources::default())
        .await
        .unwrap();

    assert_eq!(job.timeline.scene_order(), vec![1, 3, 4]);
    assert!((job.duration() - 3.0).abs() < 1e-9);
    assert_eq!(job.grade, StyleGrade::Noir);
    assert!(job.audio.is_silent());
}

#[tokio::test]
async fn no_usable_assets_is_no_media() {
    let dir = tempdir().unwrap();
    let assets = vec![
        MediaAsset::new(0, dir.path().join("gone.png")),
        MediaAsset::new(1, dir.path().join("notes.txt")),
    ];

    let err = engine(&dir)
        .assemble(assets, "vintage", AudioSources::default())
        .await
        .unwrap_err();

    assert!(err.is_no_media());
    assert!(!dir.path().join("renders").exists());
}

#[tokio::test]
async fn broken_music_leaves_a_silent_job() {
    let dir = tempdir().unwrap();
    let junk = dir.path().join("bed.mp3");
    std::fs::write(&junk, b"not audio").unwrap();

    let asset = MediaAsset::new(0, png(dir.path(), "s.png", 64, 36)).with_duration(2.0);
    let audio = AudioSources { music: Some(junk), ..Default::default() };

    let job = engine(&dir).prepare(vec![asset], "", audio).await.unwrap();
    assert!(job.audio.is_silent());
    assert_eq!(job.timeline.len(), 1);
}

#[tokio::test]
async fn style_tag_picks_grade() {
    let dir = tempdir().unwrap();
    let still = png(dir.path(), "s.png", 64, 36);

    for (tag, grade) in [
        ("Film Noir mystery", StyleGrade::Noir),
        ("neon cyberpunk", StyleGrade::Cyberpunk),
        ("warm sunset", StyleGrade::Vintage),
        ("whatever", StyleGrade::None),
    ] {
        let asset = MediaAsset::new(0, still.clone()).with_duration(1.0);
        let job = engine(&dir)
            .prepare(vec![asset], tag, AudioSources::default())
            .await
            .unwrap();
        assert_eq!(job.grade, grade, "tag {:?}", tag);
    }
}
