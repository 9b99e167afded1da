use image::{imageops, imageops::FilterType, RgbImage};
use tracing::debug;

use crate::error::{Result, VideoError};
use crate::video::types::{Frame, FrameGeometry};

/// Scale-then-center-crop that maps a source onto the canonical frame
///
/// The source is scaled so it covers the target on both axes (one axis
/// matches exactly, the other overshoots), then the overshoot is cropped
/// evenly from both sides. Nothing is ever letterboxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropPlan {
    pub source: FrameGeometry,
    pub scaled: FrameGeometry,
    pub target: FrameGeometry,
    pub crop_x: u32,
    pub crop_y: u32,
}

impl CropPlan {
    pub fn compute(source: FrameGeometry, target: FrameGeometry) -> Result<Self> {
        if source.width == 0 || source.height == 0 {
            return Err(VideoError::InvalidParameters {
                details: format!("source has zero dimension: {}", source),
            }.into());
        }
        if target.width == 0 || target.height == 0 {
            return Err(VideoError::InvalidParameters {
                details: format!("target has zero dimension: {}", target),
            }.into());
        }

        let (sw, sh) = (source.width as u64, source.height as u64);
        let (tw, th) = (target.width as u64, target.height as u64);

        // sw/sh > tw/th without going through floats
        let scaled = if sw * th > tw * sh {
            let w = ceil_div(sw * th, sh).max(tw);
            FrameGeometry::new(w as u32, target.height)
        } else {
            let h = ceil_div(sh * tw, sw).max(th);
            FrameGeometry::new(target.width, h as u32)
        };

        Ok(Self {
            source,
            scaled,
            target,
            crop_x: scaled.width.saturating_sub(target.width) / 2,
            crop_y: scaled.height.saturating_sub(target.height) / 2,
        })
    }

    /// Equivalent ffmpeg filter chain, used when decoding motion sources
    pub fn ffmpeg_filter(&self) -> String {
        format!(
            "scale={}:{}:flags=bicubic,crop={}:{}:{}:{},setsar=1",
            self.scaled.width, self.scaled.height,
            self.target.width, self.target.height,
            self.crop_x, self.crop_y
        )
    }
}

fn ceil_div(num: u64, den: u64) -> u64 {
    (num + den - 1) / den
}

/// Forces images onto the job's canonical frame geometry
#[derive(Debug, Clone, Copy)]
pub struct FrameCanonicalizer {
    target: FrameGeometry,
}

impl FrameCanonicalizer {
    pub fn new(target: FrameGeometry) -> Self {
        Self { target }
    }

    pub fn target(&self) -> FrameGeometry {
        self.target
    }

    pub fn plan(&self, source: FrameGeometry) -> Result<CropPlan> {
        CropPlan::compute(source, self.target)
    }

    /// Scale and crop a decoded image. Stills go through here once, so the
    /// slower Lanczos filter is affordable.
    pub fn canonicalize(&self, image: &RgbImage) -> Result<Frame> {
        self.canonicalize_with(image, FilterType::Lanczos3)
    }

    pub fn canonicalize_with(&self, image: &RgbImage, filter: FilterType) -> Result<Frame> {
        let plan = self.plan(FrameGeometry::new(image.width(), image.height()))?;
        debug!("Canonicalizing {} -> {} (crop {},{})",
               plan.source, plan.scaled, plan.crop_x, plan.crop_y);

        let scaled = if plan.scaled == plan.source {
            image.clone()
        } else {
            imageops::resize(image, plan.scaled.width, plan.scaled.height, filter)
        };

        let cropped = imageops::crop_imm(
            &scaled,
            plan.crop_x,
            plan.crop_y,
            self.target.width,
            self.target.height,
        )
        .to_image();

        Ok(Frame::new(cropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: FrameGeometry = FrameGeometry { width: 1920, height: 1080 };

    #[test]
    fn test_wide_source_crops_width() {
        let plan = CropPlan::compute(FrameGeometry::new(4000, 1000), HD).unwrap();
        assert_eq!(plan.scaled, FrameGeometry::new(4320, 1080));
        assert_eq!((plan.crop_x, plan.crop_y), (1200, 0));
    }

    #[test]
    fn test_tall_source_crops_height() {
        let plan = CropPlan::compute(FrameGeometry::new(1080, 1920), HD).unwrap();
        assert_eq!(plan.scaled, FrameGeometry::new(1920, 3414));
        assert_eq!((plan.crop_x, plan.crop_y), (0, 1167));
    }

    #[test]
    fn test_matching_ratio_needs_no_crop() {
        let plan = CropPlan::compute(FrameGeometry::new(1280, 720), HD).unwrap();
        assert_eq!(plan.scaled, HD);
        assert_eq!((plan.crop_x, plan.crop_y), (0, 0));
    }

    #[test]
    fn test_offsets_within_bounds_for_awkward_ratios() {
        for (w, h) in [(1, 1), (3, 7), (1921, 1081), (333, 1000), (4096, 17), (17, 4096)] {
            let plan = CropPlan::compute(FrameGeometry::new(w, h), HD).unwrap();
            assert!(plan.scaled.width >= HD.width && plan.scaled.height >= HD.height, "{}x{}", w, h);
            assert!(plan.crop_x <= plan.scaled.width - HD.width);
            assert!(plan.crop_y <= plan.scaled.height - HD.height);
        }
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(CropPlan::compute(FrameGeometry::new(0, 100), HD).is_err());
    }

    #[test]
    fn test_canonicalized_geometry_is_fixed() {
        let canonicalizer = FrameCanonicalizer::new(FrameGeometry::new(64, 36));
        for (w, h) in [(100, 20), (20, 100), (64, 36), (7, 5)] {
            let frame = canonicalizer.canonicalize(&RgbImage::new(w, h)).unwrap();
            assert_eq!(frame.geometry(), FrameGeometry::new(64, 36));
        }
    }

    #[test]
    fn test_center_crop_keeps_middle() {
        // Red left third, green middle, blue right third
        let source = RgbImage::from_fn(90, 10, |x, _| match x / 30 {
            0 => image::Rgb([255, 0, 0]),
            1 => image::Rgb([0, 255, 0]),
            _ => image::Rgb([0, 0, 255]),
        });
        let frame = FrameCanonicalizer::new(FrameGeometry::new(10, 10))
            .canonicalize_with(&source, FilterType::Nearest)
            .unwrap();
        assert_eq!(frame.get_pixel(5, 5), [0, 255, 0]);
    }

    #[test]
    fn test_ffmpeg_filter() {
        let plan = CropPlan::compute(FrameGeometry::new(4000, 1000), HD).unwrap();
        assert_eq!(plan.ffmpeg_filter(), "scale=4320:1080:flags=bicubic,crop=1920:1080:1200:0,setsar=1");
    }
}
