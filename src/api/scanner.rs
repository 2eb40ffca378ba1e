//! 标记扫描器 - 对外入口

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use crate::core::config::RunConfig;
use crate::core::error::MarkerError;
use crate::core::pipeline::{CancelToken, RunReport, ScanPipeline};
use crate::core::report::{ReportContext, ReportWriter, ThumbnailExporter};
use crate::core::scenes::{SceneBoundary, SceneMapper};
use crate::core::video::{frame_base, FrameSignalReader, FrameSource, OcrEngine, ReaderStats};

/// Result of one scan, holding on to the source for thumbnail export.
pub struct ScanOutcome<S: FrameSource> {
    pub report: RunReport,
    pub stats: ReaderStats,
    pub fps: f64,
    pub source: S,
}

/// 标记扫描器 - 读帧 + 去抖 + 场景映射 + 导出
///
/// ```ignore
/// let scanner = MarkerScanner::create(RunConfig::default())?;
/// let mut outcome = scanner.scan(source, ocr, Some(scenes), &CancelToken::new())?;
/// scanner.export(&mut outcome, &mut JsonReportWriter::create("report.json")?, Some(dir))?;
/// ```
pub struct MarkerScanner {
    config: RunConfig,
}

impl MarkerScanner {
    pub fn create(config: RunConfig) -> Result<Self, MarkerError> {
        config.validate()?;
        info!(
            "🎬 MarkerScanner: created (activate={}, deactivate={}, stride={})",
            config.activate_threshold, config.deactivate_threshold, config.sampling_stride
        );
        Ok(Self { config })
    }

    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, MarkerError> {
        Self::create(RunConfig::from_path(path)?)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Scans the whole source. Without a scene table every row lands in scene 0.
    ///
    /// `Err` only covers setup failures; problems during the run end up in
    /// `report.termination` alongside the rows built so far.
    pub fn scan<S: FrameSource>(
        &self,
        source: S,
        ocr: Arc<dyn OcrEngine>,
        scenes: Option<Vec<SceneBoundary>>,
        cancel: &CancelToken,
    ) -> Result<ScanOutcome<S>, MarkerError> {
        let policy = self.config.unmapped_interval_policy;
        let mapper = match scenes {
            Some(scenes) => SceneMapper::new(scenes, policy)?,
            None => SceneMapper::whole_movie(policy),
        };

        let mut reader = FrameSignalReader::new(source, ocr, &self.config)?;
        let fps = reader.fps();
        info!(
            "▶️ Scanning {} frames at {:.3} fps",
            reader
                .source_mut()
                .frame_count()
                .map_or_else(|| "?".to_string(), |n| n.to_string()),
            fps
        );

        let mut pipeline = ScanPipeline::new(&self.config, mapper, frame_base(fps));
        let report = pipeline.run_stream(&mut reader, cancel);
        let stats = reader.stats();

        Ok(ScanOutcome {
            report,
            stats,
            fps,
            source: reader.into_source(),
        })
    }

    /// Hands the rows to `writer` and, when `thumbnail_dir` is given, renders
    /// one JPEG per row. Returns the thumbnail paths.
    pub fn export<S: FrameSource>(
        &self,
        outcome: &mut ScanOutcome<S>,
        writer: &mut dyn ReportWriter,
        thumbnail_dir: Option<&Path>,
    ) -> Result<Vec<PathBuf>, MarkerError> {
        writer.write(&outcome.report.rows, &ReportContext::new(outcome.fps))?;

        let thumbnails = match thumbnail_dir {
            Some(dir) => ThumbnailExporter::from_config(&self.config).export(
                &mut outcome.source,
                &outcome.report.rows,
                dir,
            )?,
            None => Vec::new(),
        };
        info!("📦 Exported {} rows", outcome.report.rows.len());
        Ok(thumbnails)
    }
}

impl Drop for MarkerScanner {
    fn drop(&mut self) {
        info!("🗑️ MarkerScanner: released");
    }
}
