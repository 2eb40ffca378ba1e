//! 外部协作方接口：视频解码与 OCR

use image::GrayImage;

use crate::core::error::{OcrError, SourceError};
use crate::core::video::frame::{RawFrame, Region};

/// Random-access view over the decoded movie.
///
/// Scanning only ever asks for increasing indices; thumbnail export asks for
/// arbitrary ones.
pub trait FrameSource {
    fn fps(&self) -> f64;

    /// Total frame count if the container reports one.
    fn frame_count(&self) -> Option<u64>;

    /// `Ok(None)` means the index lies past the end of the stream.
    fn get_frame(&mut self, index: u64) -> Result<Option<RawFrame>, SourceError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    /// Raw recognized text, one line per detected text line.
    pub text: String,
    pub confidence: f32,
}

impl Recognition {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|line| !line.is_empty())
    }
}

/// Blocking OCR call over one region of a frame. Called from worker threads.
pub trait OcrEngine: Send + Sync {
    fn recognize_text(&self, image: &GrayImage, region: &Region) -> Result<Recognition, OcrError>;
}
