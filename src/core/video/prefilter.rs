use image::GrayImage;

use crate::core::config::RunConfig;
use crate::core::video::frame::{crop_region, Region};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPresence {
    pub has_text: bool,
    pub glyph_pixels: u32,
}

/// Cheap check run before OCR so blank regions never reach the engine.
pub trait TextPrefilter: Send + Sync {
    fn inspect(&self, image: &GrayImage, region: &Region) -> TextPresence;
}

/// 标记文字为白色叠加字：统计区域内接近纯白的像素数量
///
/// 白字在 1080p 画面中通常占 2000 像素以上，低于该值的帧直接跳过 OCR
pub struct BrightGlyphPrefilter {
    /// 亮度阈值 (0-255)，严格大于该值才计为字形像素
    luma_threshold: u8,
    /// 最少字形像素数
    min_pixels: u32,
}

impl BrightGlyphPrefilter {
    pub fn new(luma_threshold: u8, min_pixels: u32) -> Self {
        Self {
            luma_threshold,
            min_pixels,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.glyph_luma_threshold, config.min_text_pixels)
    }

    fn count_glyph_pixels(&self, region: &GrayImage) -> u32 {
        region
            .as_raw()
            .iter()
            .filter(|&&luma| luma > self.luma_threshold)
            .count() as u32
    }
}

impl Default for BrightGlyphPrefilter {
    fn default() -> Self {
        Self::new(245, 2000)
    }
}

impl TextPrefilter for BrightGlyphPrefilter {
    fn inspect(&self, image: &GrayImage, region: &Region) -> TextPresence {
        let cropped = crop_region(image, region);
        let glyph_pixels = self.count_glyph_pixels(&cropped);

        TextPresence {
            has_text: glyph_pixels >= self.min_pixels,
            glyph_pixels,
        }
    }
}
