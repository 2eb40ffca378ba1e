//! 扫描流水线 - 读数 → 各标记轨道 → 报表行
//!
//! 读数严格按帧序逐个喂给每条轨道；区间一旦闭合立即映射成报表行，
//! 因此中途失败或取消时，已闭合区间对应的行都会保留在 RunReport 中。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info, warn};

use crate::core::config::{ReadErrorPolicy, RunConfig};
use crate::core::error::{MarkerError, ReadError};
use crate::core::markers::{FrameReading, Interval, MarkerTrack, MarkerType};
use crate::core::report::{sort_rows, ReportAssembler, ReportRow};
use crate::core::scenes::SceneMapper;
use crate::core::video::ReadingStream;

/// Cooperative stop flag shared with whoever drives the run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum Termination {
    Completed,
    Cancelled,
    Failed(MarkerError),
}

#[derive(Debug)]
pub struct RunReport {
    pub rows: Vec<ReportRow>,
    pub frames_read: u64,
    pub frames_skipped: u64,
    pub termination: Termination,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        matches!(self.termination, Termination::Completed)
    }
}

/// Readings from a plain iterator; every frame is assumed read, so edges are
/// never refined.
struct Unrefined<I>(I);

impl<I: Iterator<Item = Result<FrameReading, ReadError>>> Iterator for Unrefined<I> {
    type Item = Result<FrameReading, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl<I: Iterator<Item = Result<FrameReading, ReadError>>> ReadingStream for Unrefined<I> {}

pub struct ScanPipeline {
    on_read_error: ReadErrorPolicy,
    tracks: Vec<MarkerTrack>,
    mapper: SceneMapper,
}

impl ScanPipeline {
    pub fn new(config: &RunConfig, mapper: SceneMapper, frame_base: u32) -> Self {
        let tracks = MarkerType::ALL
            .iter()
            .map(|&marker| MarkerTrack::new(marker, config, frame_base))
            .collect();
        Self {
            on_read_error: config.on_read_error,
            tracks,
            mapper,
        }
    }

    pub fn mapper(&self) -> &SceneMapper {
        &self.mapper
    }

    pub fn run<I>(&mut self, readings: I, cancel: &CancelToken) -> RunReport
    where
        I: IntoIterator<Item = Result<FrameReading, ReadError>>,
    {
        self.run_stream(&mut Unrefined(readings.into_iter()), cancel)
    }

    /// Like [`ScanPipeline::run`], but every closed interval is handed back to
    /// the stream to place its edges before it becomes a row.
    pub fn run_stream<R: ReadingStream>(&mut self, readings: &mut R, cancel: &CancelToken) -> RunReport {
        let assembler = ReportAssembler::new(&self.mapper);
        let mut rows = Vec::new();
        let mut frames_read = 0u64;
        let mut frames_skipped = 0u64;
        let mut termination = Termination::Completed;

        'frames: loop {
            if cancel.is_cancelled() {
                info!("⏹️ Scan cancelled after {} frames", frames_read);
                termination = Termination::Cancelled;
                break;
            }
            let Some(item) = readings.next() else {
                break;
            };

            let closed: Vec<Interval> = match item {
                Ok(reading) => {
                    frames_read += 1;
                    self.tracks.iter_mut().filter_map(|t| t.push(&reading)).collect()
                }
                Err(e) => match self.on_read_error {
                    ReadErrorPolicy::Skip => {
                        warn!("⚠️ Skipping frame {}: {}", e.frame_index, e.cause);
                        frames_skipped += 1;
                        self.tracks.iter_mut().filter_map(|t| t.push_gap()).collect()
                    }
                    ReadErrorPolicy::Abort => {
                        error!("❌ Aborting scan: {}", e);
                        termination = Termination::Failed(e.into());
                        break;
                    }
                },
            };

            for mut interval in closed {
                readings.refine_edges(&mut interval);
                match assembler.row_for(interval) {
                    Ok(row) => rows.push(row),
                    Err(e) => {
                        error!("❌ Report assembly stopped: {}", e);
                        termination = Termination::Failed(e);
                        break 'frames;
                    }
                }
            }
        }

        match termination {
            Termination::Completed => {
                for track in &mut self.tracks {
                    let Some(mut interval) = track.finish() else {
                        continue;
                    };
                    readings.refine_edges(&mut interval);
                    warn!(
                        "{} still on screen at end of stream, truncating at frame {}",
                        interval.marker, interval.end_frame
                    );
                    match assembler.row_for(interval) {
                        Ok(row) => rows.push(row),
                        Err(e) => {
                            error!("❌ Report assembly stopped: {}", e);
                            termination = Termination::Failed(e);
                            break;
                        }
                    }
                }
                // a failure above may leave later tracks open
                for track in &mut self.tracks {
                    track.abandon();
                }
            }
            _ => {
                for track in &mut self.tracks {
                    track.abandon();
                }
            }
        }

        sort_rows(&mut rows);
        info!(
            "✅ Scan finished: {} rows, {} frames read, {} skipped",
            rows.len(),
            frames_read,
            frames_skipped
        );

        RunReport {
            rows,
            frames_read,
            frames_skipped,
            termination,
        }
    }
}
