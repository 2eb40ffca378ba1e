use thiserror::Error;

/// 帧源错误（解码 / 定位失败）
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed at frame {frame}: {reason}")]
    Decode { frame: u64, reason: String },
    #[error("Frame {frame} has {actual} luma bytes, expected {expected}")]
    BadPlane {
        frame: u64,
        expected: usize,
        actual: usize,
    },
}

/// OCR 引擎错误
#[derive(Debug, Error)]
#[error("OCR failed: {0}")]
pub struct OcrError(pub String);

#[derive(Debug, Error)]
pub enum ReadCause {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// 单帧读取失败，由配置决定跳过或中止
#[derive(Debug, Error)]
#[error("Frame {frame_index} unreadable: {cause}")]
pub struct ReadError {
    pub frame_index: u64,
    pub cause: ReadCause,
}

impl ReadError {
    pub fn new(frame_index: u64, cause: impl Into<ReadCause>) -> Self {
        Self {
            frame_index,
            cause: cause.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("Invalid scene table: {0}")]
    InvalidSceneTable(String),
    #[error("Interval starting at frame {start_frame} precedes the first scene at frame {first_scene_frame}")]
    UnmappedInterval {
        start_frame: u64,
        first_scene_frame: u64,
    },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] json5::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image encode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Thumbnail frame {0} not available from source")]
    MissingFrame(u64),
    #[error(transparent)]
    Source(#[from] SourceError),
}
