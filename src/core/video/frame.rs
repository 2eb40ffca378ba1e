use std::time::Duration;

use image::GrayImage;
use serde::Deserialize;

use crate::core::error::SourceError;

/// 画面上的矩形区域（像素坐标，左上角为原点）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersects the region with a `width` x `height` frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Region {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Region {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }
}

/// 从解码层传递的原始帧（仅亮度平面，OCR 与缩略图都只需要灰度）
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
    pub timestamp: Duration,
    pub frame_index: u64,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, luma: Vec<u8>, timestamp: Duration, frame_index: u64) -> Self {
        Self {
            width,
            height,
            luma,
            timestamp,
            frame_index,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn to_gray_image(&self) -> Result<GrayImage, SourceError> {
        let expected = self.pixel_count();
        if self.luma.len() != expected {
            return Err(SourceError::BadPlane {
                frame: self.frame_index,
                expected,
                actual: self.luma.len(),
            });
        }
        GrayImage::from_raw(self.width, self.height, self.luma.clone()).ok_or(
            SourceError::BadPlane {
                frame: self.frame_index,
                expected,
                actual: self.luma.len(),
            },
        )
    }
}

/// Copies `region` out of `image`; a region hanging off the edge is clipped.
pub fn crop_region(image: &GrayImage, region: &Region) -> GrayImage {
    let clipped = region.clamp_to(image.width(), image.height());
    image::imageops::crop_imm(image, clipped.x, clipped.y, clipped.width, clipped.height).to_image()
}
