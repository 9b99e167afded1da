use rayon::prelude::*;

use crate::{error::Result, video::types::Frame};

/// A deterministic color treatment applied to every frame of a job
pub trait Style: Send + Sync {
    /// Returns the unique name of this style
    fn name(&self) -> &str;

    /// Returns a human-readable description of this style
    fn description(&self) -> &str;

    /// Apply the treatment to a frame in place
    fn apply_effect(&self, frame: &mut Frame) -> Result<()>;

    /// Whether `apply_effect` leaves frames untouched, letting callers skip it
    fn is_identity(&self) -> bool {
        false
    }
}

/// ITU-R BT.601 luma weights
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Rows per parallel work item
const ROWS_PER_TASK: usize = 16;

pub fn luma(rgb: &[u8]) -> f32 {
    rgb[0] as f32 * LUMA_WEIGHTS[0] + rgb[1] as f32 * LUMA_WEIGHTS[1] + rgb[2] as f32 * LUMA_WEIGHTS[2]
}

/// Scale a channel's distance from mid-grey
pub fn contrast_value(value: f32, factor: f32) -> u8 {
    to_u8((value - 128.0) * factor + 128.0)
}

pub fn to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Run `op` over every pixel, in parallel across row bands
pub fn for_each_pixel<F>(frame: &mut Frame, op: F)
where
    F: Fn(&mut [u8]) + Sync,
{
    let row_len = frame.width() as usize * 3;
    if row_len == 0 {
        return;
    }
    frame
        .as_bytes_mut()
        .par_chunks_mut(row_len * ROWS_PER_TASK)
        .for_each(|band| band.chunks_exact_mut(3).for_each(&op));
}
