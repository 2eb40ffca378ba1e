//! 逐帧读数生成器 - 顺序取帧，批内并行 OCR，按帧序输出

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::core::config::RunConfig;
use crate::core::error::{MarkerError, ReadError};
use crate::core::markers::{detect_markers, Detection, FrameReading, Interval, MarkerType, Signal, SignalGate};
use crate::core::video::frame::{RawFrame, Region};
use crate::core::video::prefilter::{BrightGlyphPrefilter, TextPrefilter};
use crate::core::video::source::{FrameSource, OcrEngine};
use crate::core::video::timecode::{frame_base, Timecode};

/// 读取统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReaderStats {
    pub frames_read: u64,
    pub frames_failed: u64,
    pub ocr_calls: u64,
    pub prefiltered: u64,
    /// Unsampled frames read back to place interval edges.
    pub refine_reads: u64,
}

/// Stream of readings that can re-examine the frames it stepped over.
pub trait ReadingStream: Iterator<Item = Result<FrameReading, ReadError>> {
    /// Moves the edges of a closed interval onto the exact border frames.
    /// Streams that read every frame leave the interval untouched.
    fn refine_edges(&mut self, _interval: &mut Interval) {}
}

/// The per-frame work that runs on the OCR pool.
struct FrameAnalyzer {
    ocr: Arc<dyn OcrEngine>,
    prefilter: Box<dyn TextPrefilter>,
    text_region: Option<Region>,
    timecode_region: Option<Region>,
    frame_base: u32,
    ocr_calls: AtomicU64,
    prefiltered: AtomicU64,
}

impl FrameAnalyzer {
    fn analyze(&self, frame: &RawFrame) -> Result<FrameReading, ReadError> {
        let index = frame.frame_index;
        let image = frame.to_gray_image().map_err(|e| ReadError::new(index, e))?;
        let text_region = self
            .text_region
            .unwrap_or_else(|| Region::full(frame.width, frame.height));

        let mut reading = FrameReading::new(index, frame.timestamp);

        if !self.prefilter.inspect(&image, &text_region).has_text {
            self.prefiltered.fetch_add(1, Ordering::Relaxed);
            for marker in MarkerType::ALL {
                reading.detections.insert(marker, Detection::absent(1.0));
            }
            return Ok(reading);
        }

        self.ocr_calls.fetch_add(1, Ordering::Relaxed);
        let recognition = self
            .ocr
            .recognize_text(&image, &text_region)
            .map_err(|e| ReadError::new(index, e))?;
        reading.detections = detect_markers(&recognition);

        if let Some(tc_region) = &self.timecode_region {
            self.ocr_calls.fetch_add(1, Ordering::Relaxed);
            match self.ocr.recognize_text(&image, tc_region) {
                Ok(tc) => {
                    reading.source_timecode = Timecode::parse_ocr(&tc.text, self.frame_base);
                    if reading.source_timecode.is_none() {
                        debug!("Frame {}: unreadable timecode '{}'", index, tc.text.trim());
                    }
                }
                Err(e) => warn!("Frame {}: timecode OCR failed: {}", index, e),
            }
        }

        Ok(reading)
    }
}

/// Lazy, forward-only stream of [`FrameReading`]s.
///
/// Frames are fetched sequentially (`sampling_stride` apart, from
/// `start_frame`) in batches; OCR for a batch runs on a bounded pool and the
/// results are collected back in frame order before being yielded.
pub struct FrameSignalReader<S: FrameSource> {
    source: S,
    analyzer: FrameAnalyzer,
    gate: SignalGate,
    pool: ThreadPool,
    stride: u64,
    first_index: u64,
    batch_size: usize,
    next_index: u64,
    exhausted: bool,
    buffer: VecDeque<Result<FrameReading, ReadError>>,
    frames_read: u64,
    frames_failed: u64,
    refine_reads: u64,
}

impl<S: FrameSource> FrameSignalReader<S> {
    pub fn new(source: S, ocr: Arc<dyn OcrEngine>, config: &RunConfig) -> Result<Self, MarkerError> {
        Self::with_prefilter(
            source,
            ocr,
            Box::new(BrightGlyphPrefilter::from_config(config)),
            config,
        )
    }

    pub fn with_prefilter(
        source: S,
        ocr: Arc<dyn OcrEngine>,
        prefilter: Box<dyn TextPrefilter>,
        config: &RunConfig,
    ) -> Result<Self, MarkerError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.ocr_workers.max(1))
            .thread_name(|i| format!("ocr-worker-{}", i))
            .build()
            .map_err(|e| MarkerError::Config(format!("OCR pool: {}", e)))?;

        debug!(
            "FrameSignalReader: stride={} batch={} workers={} start={}",
            config.sampling_stride, config.batch_size, config.ocr_workers, config.start_frame
        );

        let frame_base = frame_base(source.fps());
        Ok(Self {
            source,
            analyzer: FrameAnalyzer {
                ocr,
                prefilter,
                text_region: config.text_region,
                timecode_region: config.timecode_region,
                frame_base,
                ocr_calls: AtomicU64::new(0),
                prefiltered: AtomicU64::new(0),
            },
            gate: SignalGate::new(config),
            pool,
            stride: config.sampling_stride.max(1),
            first_index: config.start_frame,
            batch_size: config.batch_size.max(1),
            next_index: config.start_frame,
            exhausted: false,
            buffer: VecDeque::new(),
            frames_read: 0,
            frames_failed: 0,
            refine_reads: 0,
        })
    }

    pub fn fps(&self) -> f64 {
        self.source.fps()
    }

    pub fn stats(&self) -> ReaderStats {
        ReaderStats {
            frames_read: self.frames_read,
            frames_failed: self.frames_failed,
            ocr_calls: self.analyzer.ocr_calls.load(Ordering::Relaxed),
            prefiltered: self.analyzer.prefiltered.load(Ordering::Relaxed),
            refine_reads: self.refine_reads,
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Reads one frame outside the sampling grid, on the calling thread.
    /// Unreadable frames count as "not on screen".
    fn positive_reading(&mut self, index: u64, marker: MarkerType) -> Option<FrameReading> {
        self.refine_reads += 1;
        let frame = match self.source.get_frame(index) {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                debug!("Edge refinement stopped at frame {}: {}", index, e);
                return None;
            }
        };
        let reading = match self.analyzer.analyze(&frame) {
            Ok(reading) => reading,
            Err(e) => {
                debug!("Edge refinement stopped: {}", e);
                return None;
            }
        };
        match self.gate.classify(&reading, marker) {
            Signal::Positive(_) => Some(reading),
            _ => None,
        }
    }

    fn fill_batch(&mut self) {
        let mut fetched: Vec<Result<RawFrame, ReadError>> = Vec::with_capacity(self.batch_size);

        while fetched.len() < self.batch_size && !self.exhausted {
            let index = self.next_index;
            if self.source.frame_count().is_some_and(|total| index >= total) {
                self.exhausted = true;
                break;
            }
            match self.source.get_frame(index) {
                Ok(Some(frame)) => fetched.push(Ok(frame)),
                Ok(None) => self.exhausted = true,
                Err(e) => fetched.push(Err(ReadError::new(index, e))),
            }
            self.next_index += self.stride;
        }

        if fetched.is_empty() {
            return;
        }

        let analyzer = &self.analyzer;
        let readings: Vec<Result<FrameReading, ReadError>> = self.pool.install(|| {
            fetched
                .into_par_iter()
                .map(|item| item.and_then(|frame| analyzer.analyze(&frame)))
                .collect()
        });

        let failed = readings.iter().filter(|r| r.is_err()).count() as u64;
        self.frames_read += readings.len() as u64 - failed;
        self.frames_failed += failed;
        debug!("Batch of {} readings ({} failed)", readings.len(), failed);

        self.buffer.extend(readings);
    }
}

/// With `sampling_stride > 1` the frames between a negative sample and the
/// first positive one were never read. Walk them one by one, outward from
/// the interval, until the marker is gone.
impl<S: FrameSource> ReadingStream for FrameSignalReader<S> {
    fn refine_edges(&mut self, interval: &mut Interval) {
        if self.stride <= 1 {
            return;
        }
        let marker = interval.marker;
        let (old_start, old_end) = (interval.start_frame, interval.end_frame);

        let lower = old_start
            .saturating_sub(self.stride - 1)
            .max(self.first_index);
        while interval.start_frame > lower {
            let Some(reading) = self.positive_reading(interval.start_frame - 1, marker) else {
                break;
            };
            interval.start_frame = reading.frame_index;
            interval.start_time = reading.timestamp;
            interval.source_tc_in = reading.source_timecode;
        }

        // a truncated end is the last frame seen, not a confirmed border
        if !interval.truncated {
            let upper = old_end.saturating_add(self.stride - 1);
            while interval.end_frame < upper {
                let Some(reading) = self.positive_reading(interval.end_frame + 1, marker) else {
                    break;
                };
                interval.end_frame = reading.frame_index;
                interval.end_time = reading.timestamp;
                interval.source_tc_out = reading
                    .source_timecode
                    .map(|tc| tc.add_frames(1, self.analyzer.frame_base));
            }
        }

        if (interval.start_frame, interval.end_frame) != (old_start, old_end) {
            debug!(
                "{} edges refined [{}, {}] -> [{}, {}]",
                marker, old_start, old_end, interval.start_frame, interval.end_frame
            );
        }
    }
}

impl<S: FrameSource> Iterator for FrameSignalReader<S> {
    type Item = Result<FrameReading, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fill_batch();
        }
        self.buffer.pop_front()
    }
}
