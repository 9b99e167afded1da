use image::{imageops, imageops::FilterType, RgbImage};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::MotionConfig;

/// Which way a still's Ken Burns zoom runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// 1.0 -> zoom_max
    In,
    /// zoom_max -> 1.0
    Out,
}

/// Scale as a function of time for one still clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomPath {
    pub direction: ZoomDirection,
    pub zoom_max: f64,
    pub duration: f64,
}

impl ZoomPath {
    pub fn new(direction: ZoomDirection, zoom_max: f64, duration: f64) -> Self {
        Self { direction, zoom_max, duration }
    }

    /// Linear interpolation over `[0, duration]`, clamped outside it
    pub fn scale_at(&self, t: f64) -> f64 {
        let progress = if self.duration > 0.0 {
            (t / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let (from, to) = match self.direction {
            ZoomDirection::In => (1.0, self.zoom_max),
            ZoomDirection::Out => (self.zoom_max, 1.0),
        };
        from + (to - from) * progress
    }

    /// Render the canonical base image at time `t`: crop the centre
    /// `1/scale` of the frame and stretch it back to full size.
    pub fn apply(&self, base: &RgbImage, t: f64) -> RgbImage {
        let scale = self.scale_at(t);
        let (w, h) = base.dimensions();
        if scale <= 1.0 || w == 0 || h == 0 {
            return base.clone();
        }

        let crop_w = ((w as f64 / scale).ceil() as u32).clamp(1, w);
        let crop_h = ((h as f64 / scale).ceil() as u32).clamp(1, h);
        let x = (w - crop_w) / 2;
        let y = (h - crop_h) / 2;

        let window = imageops::crop_imm(base, x, y, crop_w, crop_h).to_image();
        imageops::resize(&window, w, h, FilterType::Triangle)
    }
}

/// How a motion source is fitted to its scene duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionPlan {
    /// Source shorter than the scene: repeat it until the scene is filled
    Loop,
    /// Source longer than the scene: play the centre section
    Trim { start_offset: f64 },
    /// Lengths already agree
    Pass,
}

impl MotionPlan {
    /// Lengths closer than this are treated as equal
    const TOLERANCE: f64 = 1e-3;

    /// Unknown native length is planned as a loop so the scene is always filled
    pub fn for_durations(native: Option<f64>, target: f64) -> Self {
        match native {
            None => MotionPlan::Loop,
            Some(native) if native + Self::TOLERANCE < target => MotionPlan::Loop,
            Some(native) if native > target + Self::TOLERANCE => MotionPlan::Trim {
                start_offset: (native - target) / 2.0,
            },
            Some(_) => MotionPlan::Pass,
        }
    }
}

/// Picks zoom directions for stills from an injectable random source
pub struct MotionSynthesizer<R: Rng> {
    rng: R,
    zoom_max: f64,
}

impl MotionSynthesizer<StdRng> {
    /// Seeded from `motion.seed` when set, otherwise from OS entropy
    pub fn from_config(config: &MotionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(rng, config.zoom_max)
    }
}

impl<R: Rng> MotionSynthesizer<R> {
    pub fn new(rng: R, zoom_max: f64) -> Self {
        Self { rng, zoom_max }
    }

    pub fn next_direction(&mut self) -> ZoomDirection {
        if self.rng.gen_bool(0.5) {
            ZoomDirection::In
        } else {
            ZoomDirection::Out
        }
    }

    pub fn zoom_for(&mut self, duration: f64) -> ZoomPath {
        let direction = self.next_direction();
        ZoomPath::new(direction, self.zoom_max, duration)
    }
}
