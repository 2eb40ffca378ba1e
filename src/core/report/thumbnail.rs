use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::ImageOutputFormat;
use log::{debug, info};

use crate::core::config::RunConfig;
use crate::core::error::ReportError;
use crate::core::report::row::ReportRow;
use crate::core::video::{FrameSource, RawFrame};

const JPEG_QUALITY: u8 = 70;

/// 缩略图导出：按行的 thumbnail_frame_index 回源取帧，缩放后存 JPEG
pub struct ThumbnailExporter {
    scale: f32,
    quality: u8,
}

impl ThumbnailExporter {
    pub fn new(scale: f32) -> Self {
        Self {
            scale: scale.clamp(0.01, 1.0),
            quality: JPEG_QUALITY,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.thumbnail_scale)
    }

    pub fn render(&self, frame: &RawFrame) -> Result<Vec<u8>, ReportError> {
        let image = frame.to_gray_image()?;
        let width = ((image.width() as f32 * self.scale).round() as u32).max(1);
        let height = ((image.height() as f32 * self.scale).round() as u32).max(1);
        let small = imageops::resize(&image, width, height, FilterType::Triangle);

        let mut buffer = Cursor::new(Vec::new());
        small.write_to(&mut buffer, ImageOutputFormat::Jpeg(self.quality))?;
        Ok(buffer.into_inner())
    }

    /// Writes `<dir>/<frame>.jpg` once per distinct thumbnail frame.
    pub fn export<S: FrameSource + ?Sized>(
        &self,
        source: &mut S,
        rows: &[ReportRow],
        dir: &Path,
    ) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(dir)?;

        let frames: BTreeSet<u64> = rows.iter().map(|row| row.thumbnail_frame_index).collect();
        let mut written = Vec::with_capacity(frames.len());
        for index in frames {
            let frame = source
                .get_frame(index)?
                .ok_or(ReportError::MissingFrame(index))?;
            let jpeg = self.render(&frame)?;
            let path = dir.join(format!("{}.jpg", index));
            fs::write(&path, &jpeg)?;
            debug!("Thumbnail {:?}: {} bytes", path, jpeg.len());
            written.push(path);
        }

        info!("🖼️ Exported {} thumbnails to {:?}", written.len(), dir);
        Ok(written)
    }
}
