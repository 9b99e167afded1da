use crate::{
    error::Result,
    styles::traits::{contrast_value, for_each_pixel, luma, Style},
    video::types::Frame,
};

use super::NOIR_CONTRAST;

/// Black-and-white grade
pub struct NoirStyle {
    contrast: f32,
}

impl NoirStyle {
    pub fn new() -> Self {
        Self { contrast: NOIR_CONTRAST }
    }
}

impl Default for NoirStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl Style for NoirStyle {
    fn name(&self) -> &str {
        "noir"
    }

    fn description(&self) -> &str {
        "Fully desaturated with boosted contrast"
    }

    fn apply_effect(&self, frame: &mut Frame) -> Result<()> {
        let contrast = self.contrast;
        for_each_pixel(frame, |px| {
            let grey = contrast_value(luma(px), contrast);
            px.fill(grey);
        });
        Ok(())
    }
}
