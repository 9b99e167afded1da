use crate::{
    error::Result,
    styles::traits::{for_each_pixel, luma, to_u8, Style},
    video::types::Frame,
};

use super::VINTAGE_SATURATION;

/// Vintage grade: saturation x1.1
pub struct VintageStyle {
    saturation: f32,
}

impl VintageStyle {
    pub fn new() -> Self {
        Self { saturation: VINTAGE_SATURATION }
    }
}

impl Default for VintageStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl Style for VintageStyle {
    fn name(&self) -> &str {
        "vintage"
    }

    fn description(&self) -> &str {
        "Slightly richer colors"
    }

    fn apply_effect(&self, frame: &mut Frame) -> Result<()> {
        let saturation = self.saturation;
        for_each_pixel(frame, |px| {
            let lum = luma(px);
            for channel in px.iter_mut() {
                *channel = to_u8(lum + (*channel as f32 - lum) * saturation);
            }
        });
        Ok(())
    }
}
