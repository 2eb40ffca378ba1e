pub mod config;
pub mod error;
pub mod markers;
pub mod pipeline;
pub mod report;
pub mod scenes;
pub mod video;

pub use config::{LowConfidencePolicy, ReadErrorPolicy, RunConfig, UnmappedIntervalPolicy};
pub use error::{MarkerError, OcrError, ReadError, ReportError, SourceError};
pub use pipeline::{CancelToken, RunReport, ScanPipeline, Termination};
