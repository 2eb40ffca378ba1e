use std::time::Duration;

use log::{debug, warn};

use crate::core::markers::debouncer::Edge;
use crate::core::markers::label::consensus;
use crate::core::markers::reading::{FrameMark, MarkerType};
use crate::core::video::Timecode;

/// 一段确认过的标记区间（帧号两端闭区间）
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub marker: MarkerType,
    pub start_frame: u64,
    pub end_frame: u64,
    pub start_time: Duration,
    pub end_time: Duration,
    /// The stream ended before the marker went away.
    pub truncated: bool,
    pub label: Option<String>,
    pub source_tc_in: Option<Timecode>,
    pub source_tc_out: Option<Timecode>,
}

impl Interval {
    /// First frame after the interval.
    pub fn frame_out(&self) -> u64 {
        self.end_frame + 1
    }

    pub fn duration(&self) -> Duration {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// Turns debouncer edges into [`Interval`]s for one marker type.
pub struct IntervalAccumulator {
    marker: MarkerType,
    frame_base: u32,
    open: Option<FrameMark>,
    labels: Vec<String>,
    emitted: u64,
}

impl IntervalAccumulator {
    pub fn new(marker: MarkerType, frame_base: u32) -> Self {
        Self {
            marker,
            frame_base,
            open: None,
            labels: Vec::new(),
            emitted: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn emitted_count(&self) -> u64 {
        self.emitted
    }

    /// Remembers the cue text of a positive reading in the current run.
    pub fn note_label(&mut self, text: &str) {
        self.labels.push(text.to_string());
    }

    /// Drops labels gathered by a pending run that turned out to be noise.
    pub fn discard_pending(&mut self) {
        if self.open.is_none() {
            self.labels.clear();
        }
    }

    pub fn on_edge(&mut self, edge: Edge) -> Option<Interval> {
        match edge {
            Edge::Rising { onset } => {
                debug!("{} opens at frame {}", self.marker, onset.frame_index);
                self.open = Some(onset);
                None
            }
            Edge::Falling { last_positive } => match self.open.take() {
                Some(onset) => Some(self.close(onset, last_positive, false)),
                None => {
                    warn!(
                        "{} falling edge at frame {} without an open interval",
                        self.marker, last_positive.frame_index
                    );
                    None
                }
            },
        }
    }

    /// Closes a run cut off by the end of the stream at `last_seen`.
    pub fn finish(&mut self, last_seen: Option<FrameMark>) -> Option<Interval> {
        let onset = self.open.take()?;
        let end = match last_seen {
            Some(mark) if mark.frame_index >= onset.frame_index => mark,
            _ => onset.clone(),
        };
        Some(self.close(onset, end, true))
    }

    /// Forgets the open run without emitting it (cancelled scan).
    pub fn abandon(&mut self) {
        if let Some(onset) = self.open.take() {
            debug!("{} run from frame {} abandoned", self.marker, onset.frame_index);
        }
        self.labels.clear();
    }

    fn close(&mut self, onset: FrameMark, end: FrameMark, truncated: bool) -> Interval {
        let labels = std::mem::take(&mut self.labels);
        self.emitted += 1;

        let interval = Interval {
            marker: self.marker,
            start_frame: onset.frame_index,
            end_frame: end.frame_index,
            start_time: onset.timestamp,
            end_time: end.timestamp.max(onset.timestamp),
            truncated,
            label: consensus(&labels),
            source_tc_in: onset.source_timecode,
            source_tc_out: end.source_timecode.map(|tc| tc.add_frames(1, self.frame_base)),
        };
        debug!(
            "{} interval [{}, {}]{}",
            self.marker,
            interval.start_frame,
            interval.end_frame,
            if truncated { " (truncated)" } else { "" }
        );
        interval
    }
}
