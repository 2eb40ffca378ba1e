use crate::core::config::RunConfig;
use crate::core::markers::accumulator::{Interval, IntervalAccumulator};
use crate::core::markers::debouncer::{DebouncedState, Edge, SignalDebouncer};
use crate::core::markers::reading::{FrameMark, FrameReading, MarkerType, Signal, SignalGate};

/// Debouncer + accumulator for one marker type. Tracks share nothing, so
/// each can be fed from its own thread as long as readings arrive in order.
pub struct MarkerTrack {
    marker: MarkerType,
    gate: SignalGate,
    debouncer: SignalDebouncer,
    accumulator: IntervalAccumulator,
    last_seen: Option<FrameMark>,
    falling_edges: u64,
}

impl MarkerTrack {
    pub fn new(marker: MarkerType, config: &RunConfig, frame_base: u32) -> Self {
        Self {
            marker,
            gate: SignalGate::new(config),
            debouncer: SignalDebouncer::new(config),
            accumulator: IntervalAccumulator::new(marker, frame_base),
            last_seen: None,
            falling_edges: 0,
        }
    }

    pub fn marker(&self) -> MarkerType {
        self.marker
    }

    pub fn state(&self) -> &DebouncedState {
        self.debouncer.current_state()
    }

    /// Confirmed active→inactive transitions seen so far.
    pub fn falling_edges(&self) -> u64 {
        self.falling_edges
    }

    pub fn push(&mut self, reading: &FrameReading) -> Option<Interval> {
        self.last_seen = Some(reading.mark());

        let signal = self.gate.classify(reading, self.marker);
        if let Signal::Positive(_) = signal {
            if let Some(text) = reading
                .detections
                .get(&self.marker)
                .and_then(|d| d.text.as_deref())
            {
                self.accumulator.note_label(text);
            }
        }
        self.apply(signal)
    }

    /// An unreadable frame counts against an active run.
    pub fn push_gap(&mut self) -> Option<Interval> {
        self.apply(Signal::Negative)
    }

    /// End of stream: an open run becomes a truncated interval.
    pub fn finish(&mut self) -> Option<Interval> {
        let last_seen = self.last_seen.take();
        let interval = if self.debouncer.current_state().is_active() {
            self.accumulator.finish(last_seen)
        } else {
            None
        };
        self.debouncer.reset();
        self.accumulator.abandon();
        interval
    }

    /// Cancellation: the open run is dropped, closed intervals are unaffected.
    pub fn abandon(&mut self) {
        self.debouncer.reset();
        self.accumulator.abandon();
        self.last_seen = None;
    }

    fn apply(&mut self, signal: Signal) -> Option<Interval> {
        let edge = self.debouncer.feed(signal);
        let closed = match edge {
            Some(edge) => {
                if matches!(edge, Edge::Falling { .. }) {
                    self.falling_edges += 1;
                }
                self.accumulator.on_edge(edge)
            }
            None => None,
        };
        if *self.debouncer.current_state() == DebouncedState::Inactive {
            self.accumulator.discard_pending();
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markers::reading::Detection;
    use std::time::Duration;

    fn config(activate: u32, deactivate: u32) -> RunConfig {
        RunConfig {
            activate_threshold: activate,
            deactivate_threshold: deactivate,
            ..Default::default()
        }
    }

    fn reading(frame: u64, present: bool) -> FrameReading {
        let detection = if present {
            Detection::found(0.9, "VFX 042 matte")
        } else {
            Detection::absent(0.9)
        };
        FrameReading::new(frame, Duration::from_millis(frame * 40)).with_detection(MarkerType::Vfx, detection)
    }

    fn run(track: &mut MarkerTrack, pattern: &[bool]) -> Vec<Interval> {
        let mut intervals: Vec<Interval> = pattern
            .iter()
            .enumerate()
            .filter_map(|(i, &present)| track.push(&reading(i as u64, present)))
            .collect();
        intervals.extend(track.finish());
        intervals
    }

    #[test]
    fn test_scenario_single_run_backdated() {
        let mut track = MarkerTrack::new(MarkerType::Vfx, &config(2, 2), 24);
        let pattern = [false, false, true, true, true, false, false];

        let intervals = run(&mut track, &pattern);

        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start_frame, 2);
        assert_eq!(intervals[0].end_frame, 4);
        assert!(!intervals[0].truncated);
        assert_eq!(intervals[0].label.as_deref(), Some("VFX 042 matte"));
    }

    #[test]
    fn test_scenario_spurious_positive_is_dropped() {
        let mut track = MarkerTrack::new(MarkerType::Vfx, &config(2, 2), 24);
        let intervals = run(&mut track, &[false, false, true, false, false]);
        assert!(intervals.is_empty());
    }

    #[test]
    fn test_scenario_stream_ends_mid_run() {
        let mut track = MarkerTrack::new(MarkerType::Vfx, &config(2, 2), 24);
        let intervals = run(&mut track, &[false, true, true, true, true]);

        assert_eq!(intervals.len(), 1);
        assert!(intervals[0].truncated);
        assert_eq!(intervals[0].start_frame, 1);
        assert_eq!(intervals[0].end_frame, 4);
    }

    #[test]
    fn test_stream_ends_while_pending_inactive() {
        let mut track = MarkerTrack::new(MarkerType::Vfx, &config(1, 3), 24);
        let intervals = run(&mut track, &[true, true, false, false]);

        assert_eq!(intervals.len(), 1);
        assert!(intervals[0].truncated);
        assert_eq!(intervals[0].end_frame, 3);
    }

    #[test]
    fn test_stream_ends_while_pending_active() {
        let mut track = MarkerTrack::new(MarkerType::Vfx, &config(3, 2), 24);
        let intervals = run(&mut track, &[false, true, true]);
        assert!(intervals.is_empty());
    }

    #[test]
    fn test_flicker_inside_run_is_absorbed() {
        let mut track = MarkerTrack::new(MarkerType::Vfx, &config(2, 3), 24);
        let pattern = [true, true, false, true, false, false, true, true, false, false, false];

        let intervals = run(&mut track, &pattern);

        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start_frame, 0);
        assert_eq!(intervals[0].end_frame, 7);
    }

    #[test]
    fn test_low_confidence_does_not_break_run() {
        let mut track = MarkerTrack::new(MarkerType::Vfx, &config(2, 2), 24);
        let mut intervals = Vec::new();
        for frame in 0..4 {
            intervals.extend(track.push(&reading(frame, true)));
        }
        for frame in 4..8 {
            let weak = FrameReading::new(frame, Duration::from_millis(frame * 40))
                .with_detection(MarkerType::Vfx, Detection::found(0.1, "VFX 042 matte"));
            intervals.extend(track.push(&weak));
        }
        for frame in 8..10 {
            intervals.extend(track.push(&reading(frame, false)));
        }

        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].end_frame, 3);
    }

    #[test]
    fn test_gap_counts_as_negative() {
        let mut track = MarkerTrack::new(MarkerType::Vfx, &config(1, 2), 24);
        track.push(&reading(0, true));
        track.push(&reading(1, true));
        assert_eq!(track.push_gap(), None);
        let closed = track.push_gap().unwrap();
        assert_eq!(closed.end_frame, 1);
    }

    #[test]
    fn test_interval_count_matches_falling_edges_across_thresholds() {
        let pattern: Vec<bool> = (0..200u64).map(|i| (i * 7 + i / 3) % 11 < 5).collect();

        for activate in 1..=4 {
            for deactivate in 1..=4 {
                let mut track = MarkerTrack::new(MarkerType::Vfx, &config(activate, deactivate), 24);
                let mut closed = Vec::new();
                for (i, &present) in pattern.iter().enumerate() {
                    closed.extend(track.push(&reading(i as u64, present)));
                }
                let edges = track.falling_edges();
                let was_active = track.state().is_active();
                let truncated = track.finish();

                assert_eq!(closed.len() as u64, edges);
                assert_eq!(truncated.is_some(), was_active);

                let all: Vec<&Interval> = closed.iter().chain(truncated.iter()).collect();
                for interval in &all {
                    assert!(interval.start_frame <= interval.end_frame);
                    assert!(interval.start_time <= interval.end_time);
                }
                for pair in all.windows(2) {
                    assert!(pair[0].end_frame < pair[1].start_frame);
                }
            }
        }
    }

    #[test]
    fn test_abandon_discards_open_run() {
        let mut track = MarkerTrack::new(MarkerType::Vfx, &config(1, 2), 24);
        track.push(&reading(0, true));
        track.abandon();
        assert_eq!(track.finish(), None);
    }
}
