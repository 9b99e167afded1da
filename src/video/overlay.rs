use std::path::{Path, PathBuf};

use fontdue::layout::{
    CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign, WrapStyle,
};
use fontdue::{Font, FontSettings};
use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::video::types::{Frame, FrameGeometry};

/// Searched when `overlay.font_path` is unset or unreadable
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Whether a caption is long enough to be drawn
pub fn should_caption(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

/// A caption pre-rendered as coverage masks for one frame width
///
/// Rendered once per clip, then blended onto every frame of that clip.
#[derive(Debug, Clone)]
pub struct CaptionLayer {
    /// Frame row of the strip's first line
    pub top: u32,
    pub width: u32,
    pub height: u32,

    /// Text coverage, 0-255, row major
    text: Vec<u8>,

    /// Shadow coverage, already scaled by the shadow alpha
    shadow: Vec<u8>,
}

impl CaptionLayer {
    const TEXT_COLOR: [u8; 3] = [255, 255, 255];
    const SHADOW_COLOR: [u8; 3] = [0, 0, 0];

    pub fn from_masks(top: u32, width: u32, height: u32, text: Vec<u8>, shadow: Vec<u8>) -> Option<Self> {
        let len = width as usize * height as usize;
        (text.len() == len && shadow.len() == len).then_some(Self { top, width, height, text, shadow })
    }

    /// Blend the shadow, then the text, onto the frame. Rows past the
    /// bottom edge are clipped.
    pub fn composite(&self, frame: &mut Frame) {
        let frame_w = frame.width() as usize;
        let frame_h = frame.height() as usize;
        let cols = (self.width as usize).min(frame_w);
        let layer_w = self.width as usize;
        let bytes = frame.as_bytes_mut();

        for row in 0..self.height as usize {
            let y = self.top as usize + row;
            if y >= frame_h {
                break;
            }
            for col in 0..cols {
                let mask_idx = row * layer_w + col;
                let px = (y * frame_w + col) * 3;
                blend(&mut bytes[px..px + 3], Self::SHADOW_COLOR, self.shadow[mask_idx]);
                blend(&mut bytes[px..px + 3], Self::TEXT_COLOR, self.text[mask_idx]);
            }
        }
    }
}

fn blend(pixel: &mut [u8], color: [u8; 3], alpha: u8) {
    if alpha == 0 {
        return;
    }
    let a = alpha as u32;
    for (channel, &c) in pixel.iter_mut().zip(color.iter()) {
        *channel = ((c as u32 * a + *channel as u32 * (255 - a) + 127) / 255) as u8;
    }
}

/// Renders bottom-centred captions with a drop shadow
pub struct CaptionRenderer {
    font: Font,
    config: OverlayConfig,
}

impl CaptionRenderer {
    /// Load the configured font, falling back to common system fonts
    pub fn load(config: &OverlayConfig) -> Result<Self, OverlayError> {
        let candidates: Vec<PathBuf> = config
            .font_path
            .iter()
            .cloned()
            .chain(FALLBACK_FONTS.iter().map(PathBuf::from))
            .collect();
        Self::load_from(&candidates, config)
    }

    /// First candidate that reads and parses wins
    pub fn load_from(candidates: &[PathBuf], config: &OverlayConfig) -> Result<Self, OverlayError> {
        for path in candidates {
            match Self::read_font(path) {
                Some(font) => {
                    info!("Caption font: {:?}", path);
                    return Ok(Self { font, config: config.clone() });
                }
                None => debug!("Caption font candidate unusable: {:?}", path),
            }
        }

        Err(OverlayError::FontUnavailable {
            tried: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    fn read_font(path: &Path) -> Option<Font> {
        let bytes = std::fs::read(path).ok()?;
        Font::from_bytes(bytes, FontSettings::default()).ok()
    }

    /// Lay out and rasterize `text` for frames of the given geometry
    pub fn render(&self, text: &str, geometry: FrameGeometry) -> Result<CaptionLayer, OverlayError> {
        let text = text.trim();
        let side = self.config.side_margin.min(geometry.width / 4) as f32;
        let max_width = geometry.width as f32 - 2.0 * side;

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: side,
            y: 0.0,
            max_width: Some(max_width),
            max_height: None,
            horizontal_align: HorizontalAlign::Center,
            vertical_align: VerticalAlign::Top,
            line_height: 1.0,
            wrap_style: WrapStyle::Word,
            wrap_hard_breaks: true,
        });
        layout.append(&[&self.font], &TextStyle::new(text, self.config.font_size, 0));

        let text_h = layout.height().ceil() as u32;
        if text_h == 0 || layout.glyphs().iter().all(|g| g.width == 0 || g.height == 0) {
            return Err(OverlayError::RenderFailed {
                reason: format!("nothing to draw for {:?}", text),
            });
        }

        let offset = self.config.shadow_offset;
        let width = geometry.width;
        let height = text_h + offset;
        let mut text_mask = vec![0u8; width as usize * height as usize];

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (_, bitmap) = self.font.rasterize_config(glyph.key);
            let gx = glyph.x.round() as i64;
            let gy = glyph.y.round() as i64;
            for row in 0..glyph.height {
                for col in 0..glyph.width {
                    let x = gx + col as i64;
                    let y = gy + row as i64;
                    if x < 0 || y < 0 || x >= width as i64 || y >= text_h as i64 {
                        continue;
                    }
                    let idx = y as usize * width as usize + x as usize;
                    let coverage = bitmap[row * glyph.width + col];
                    text_mask[idx] = text_mask[idx].max(coverage);
                }
            }
        }

        let shadow_mask = shadow_of(&text_mask, width, height, offset, self.config.shadow_alpha);
        let top = geometry.height.saturating_sub(text_h + self.config.bottom_margin);
        debug!("Caption {:?}: {} rows at y={}", text, text_h, top);

        CaptionLayer::from_masks(top, width, height, text_mask, shadow_mask).ok_or_else(|| {
            OverlayError::RenderFailed { reason: "mask size mismatch".to_string() }
        })
    }
}

/// The text mask shifted down-right by `offset`, scaled to `alpha`
fn shadow_of(text: &[u8], width: u32, height: u32, offset: u32, alpha: u8) -> Vec<u8> {
    let (w, h, off) = (width as usize, height as usize, offset as usize);
    let mut shadow = vec![0u8; w * h];
    for y in off..h {
        for x in off..w {
            let coverage = text[(y - off) * w + (x - off)] as u32;
            shadow[y * w + x] = ((coverage * alpha as u32 + 127) / 255) as u8;
        }
    }
    shadow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_length_threshold() {
        assert!(!should_caption("", 2));
        assert!(!should_caption(" A ", 2));
        assert!(should_caption("Hi", 2));
        assert!(should_caption("Über", 2));
    }

    #[test]
    fn test_missing_font_is_overlay_error() {
        let config = OverlayConfig::default();
        let err = CaptionRenderer::load_from(&[PathBuf::from("/nope/font.ttf")], &config)
            .err()
            .unwrap();
        assert!(matches!(err, OverlayError::FontUnavailable { .. }));
        assert!(err.to_string().contains("/nope/font.ttf"));
    }

    #[test]
    fn test_shadow_is_offset_and_attenuated() {
        let mut text = vec![0u8; 4 * 4];
        text[0] = 255;
        let shadow = shadow_of(&text, 4, 4, 2, 180);
        assert_eq!(shadow[2 * 4 + 2], 180);
        assert_eq!(shadow.iter().filter(|&&v| v > 0).count(), 1);
    }

    #[test]
    fn test_composite_shadow_then_text() {
        // One column: row 0 text, row 1 shadow only
        let layer = CaptionLayer::from_masks(1, 1, 2, vec![255, 0], vec![0, 180]).unwrap();
        let mut frame = Frame::new_filled(1, 4, [100, 100, 100]);
        layer.composite(&mut frame);

        assert_eq!(frame.get_pixel(0, 0), [100, 100, 100]);
        assert_eq!(frame.get_pixel(0, 1), [255, 255, 255]);
        // 100 * (75/255) rounds to 29
        assert_eq!(frame.get_pixel(0, 2), [29, 29, 29]);
        assert_eq!(frame.get_pixel(0, 3), [100, 100, 100]);
    }

    #[test]
    fn test_composite_clips_at_frame_bottom() {
        let layer = CaptionLayer::from_masks(3, 2, 3, vec![255; 6], vec![0; 6]).unwrap();
        let mut frame = Frame::new_black(2, 4);
        layer.composite(&mut frame);
        assert_eq!(frame.get_pixel(1, 3), [255, 255, 255]);
        assert_eq!(frame.get_pixel(1, 2), [0, 0, 0]);
    }

    #[test]
    fn test_mask_size_checked() {
        assert!(CaptionLayer::from_masks(0, 2, 2, vec![0; 3], vec![0; 4]).is_none());
    }

    #[test]
    fn test_render_places_caption_above_margin() {
        // Runs only where a system font is installed
        let config = OverlayConfig::default();
        let Ok(renderer) = CaptionRenderer::load(&config) else {
            return;
        };
        let geometry = FrameGeometry::new(1920, 1080);
        let layer = renderer.render("Hello world", geometry).unwrap();

        assert_eq!(layer.width, 1920);
        let text_h = layer.height - config.shadow_offset;
        assert_eq!(layer.top + text_h + config.bottom_margin, 1080);

        let mut frame = Frame::new_black(1920, 1080);
        layer.composite(&mut frame);
        let lit = frame.as_bytes().iter().filter(|&&b| b > 0).count();
        assert!(lit > 0);
    }
}
