use crate::{
    error::Result,
    styles::traits::{contrast_value, for_each_pixel, Style},
    video::types::Frame,
};

use super::CYBERPUNK_CONTRAST;

pub struct CyberpunkStyle {
    contrast: f32,
}

impl CyberpunkStyle {
    pub fn new() -> Self {
        Self { contrast: CYBERPUNK_CONTRAST }
    }
}

impl Default for CyberpunkStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl Style for CyberpunkStyle {
    fn name(&self) -> &str {
        "cyberpunk"
    }

    fn description(&self) -> &str {
        "Contrast pushed 20% around mid-grey"
    }

    fn apply_effect(&self, frame: &mut Frame) -> Result<()> {
        let contrast = self.contrast;
        for_each_pixel(frame, |px| {
            for channel in px.iter_mut() {
                *channel = contrast_value(*channel as f32, contrast);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contrast_keeps_hue_order() {
        let mut frame = Frame::new_filled(2, 2, [200, 128, 60]);
        CyberpunkStyle::new().apply_effect(&mut frame).unwrap();
        // 200 -> 214.4, 128 -> 128, 60 -> 46.4
        assert_eq!(frame.get_pixel(1, 1), [214, 128, 46]);
    }
}
