use log::debug;

use crate::core::config::RunConfig;
use crate::core::markers::reading::{FrameMark, Signal};

#[derive(Debug, Clone, PartialEq)]
pub enum DebouncedState {
    Inactive,
    PendingActive { count: u32, onset: FrameMark },
    Active { last_positive: FrameMark },
    PendingInactive { count: u32, last_positive: FrameMark },
}

/// Confirmed change of the cleaned signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Edge {
    /// `onset` is the first positive reading of the confirmed run.
    Rising { onset: FrameMark },
    /// `last_positive` is the last positive reading before the confirmed gap.
    Falling { last_positive: FrameMark },
}

#[derive(Debug, Clone, Copy)]
pub struct DebounceConfig {
    pub activate_threshold: u32,
    pub deactivate_threshold: u32,
}

impl DebounceConfig {
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            activate_threshold: config.activate_threshold.max(1),
            deactivate_threshold: config.deactivate_threshold.max(1),
        }
    }
}

impl DebouncedState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            DebouncedState::Active { .. } | DebouncedState::PendingInactive { .. }
        )
    }

    pub fn transition(&self, signal: Signal, config: &DebounceConfig) -> (DebouncedState, Option<Edge>) {
        match (self, signal) {
            (DebouncedState::Inactive, Signal::Positive(mark)) => {
                if config.activate_threshold <= 1 {
                    (
                        DebouncedState::Active {
                            last_positive: mark.clone(),
                        },
                        Some(Edge::Rising { onset: mark }),
                    )
                } else {
                    (
                        DebouncedState::PendingActive {
                            count: 1,
                            onset: mark,
                        },
                        None,
                    )
                }
            }
            (DebouncedState::Inactive, _) => (DebouncedState::Inactive, None),

            (DebouncedState::PendingActive { count, onset }, Signal::Positive(mark)) => {
                let new_count = count + 1;
                if new_count >= config.activate_threshold {
                    (
                        DebouncedState::Active { last_positive: mark },
                        Some(Edge::Rising {
                            onset: onset.clone(),
                        }),
                    )
                } else {
                    (
                        DebouncedState::PendingActive {
                            count: new_count,
                            onset: onset.clone(),
                        },
                        None,
                    )
                }
            }
            (DebouncedState::PendingActive { .. }, Signal::Negative) => (DebouncedState::Inactive, None),

            (DebouncedState::Active { .. }, Signal::Positive(mark)) => {
                (DebouncedState::Active { last_positive: mark }, None)
            }
            (DebouncedState::Active { last_positive }, Signal::Negative) => {
                if config.deactivate_threshold <= 1 {
                    (
                        DebouncedState::Inactive,
                        Some(Edge::Falling {
                            last_positive: last_positive.clone(),
                        }),
                    )
                } else {
                    (
                        DebouncedState::PendingInactive {
                            count: 1,
                            last_positive: last_positive.clone(),
                        },
                        None,
                    )
                }
            }

            (DebouncedState::PendingInactive { .. }, Signal::Positive(mark)) => {
                (DebouncedState::Active { last_positive: mark }, None)
            }
            (DebouncedState::PendingInactive { count, last_positive }, Signal::Negative) => {
                let new_count = count + 1;
                if new_count >= config.deactivate_threshold {
                    (
                        DebouncedState::Inactive,
                        Some(Edge::Falling {
                            last_positive: last_positive.clone(),
                        }),
                    )
                } else {
                    (
                        DebouncedState::PendingInactive {
                            count: new_count,
                            last_positive: last_positive.clone(),
                        },
                        None,
                    )
                }
            }

            // 低置信度 / 未检测：保持原状态
            (state, Signal::Uncertain) => (state.clone(), None),
        }
    }
}

/// 单一标记类型的去抖状态机，每种标记各持有一个实例
pub struct SignalDebouncer {
    state: DebouncedState,
    config: DebounceConfig,
    signal_counter: u64,
}

impl SignalDebouncer {
    pub fn new(config: &RunConfig) -> Self {
        Self::with_config(DebounceConfig::from_run_config(config))
    }

    pub fn with_config(config: DebounceConfig) -> Self {
        Self {
            state: DebouncedState::Inactive,
            config,
            signal_counter: 0,
        }
    }

    pub fn feed(&mut self, signal: Signal) -> Option<Edge> {
        self.signal_counter += 1;

        let (new_state, edge) = self.state.transition(signal, &self.config);
        if let Some(edge) = &edge {
            debug!("Debouncer edge after {} signals: {:?}", self.signal_counter, edge);
        }
        self.state = new_state;

        edge
    }

    pub fn current_state(&self) -> &DebouncedState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = DebouncedState::Inactive;
        self.signal_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pos(frame: u64) -> Signal {
        Signal::Positive(FrameMark {
            frame_index: frame,
            timestamp: Duration::from_millis(frame * 40),
            source_timecode: None,
        })
    }

    fn debouncer(activate: u32, deactivate: u32) -> SignalDebouncer {
        SignalDebouncer::with_config(DebounceConfig {
            activate_threshold: activate,
            deactivate_threshold: deactivate,
        })
    }

    #[test]
    fn test_inactive_to_pending_active() {
        let mut db = debouncer(2, 2);

        assert_eq!(db.current_state(), &DebouncedState::Inactive);

        let edge = db.feed(pos(0));
        assert!(matches!(
            db.current_state(),
            DebouncedState::PendingActive { count: 1, .. }
        ));
        assert_eq!(edge, None);
    }

    #[test]
    fn test_pending_active_confirms_with_backdated_onset() {
        let mut db = debouncer(3, 2);

        db.feed(pos(10));
        db.feed(pos(11));
        let edge = db.feed(pos(12));

        match edge {
            Some(Edge::Rising { onset }) => assert_eq!(onset.frame_index, 10),
            other => panic!("expected rising edge, got {:?}", other),
        }
        assert!(db.current_state().is_active());
    }

    #[test]
    fn test_pending_active_reverts_on_negative() {
        let mut db = debouncer(2, 2);

        db.feed(pos(0));
        db.feed(Signal::Negative);

        assert_eq!(db.current_state(), &DebouncedState::Inactive);
    }

    #[test]
    fn test_pending_inactive_reverts_on_positive() {
        let mut db = debouncer(1, 3);

        db.feed(pos(0));
        db.feed(Signal::Negative);
        db.feed(Signal::Negative);
        assert!(matches!(
            db.current_state(),
            DebouncedState::PendingInactive { count: 2, .. }
        ));

        db.feed(pos(3));
        assert!(matches!(
            db.current_state(),
            DebouncedState::Active { last_positive } if last_positive.frame_index == 3
        ));
    }

    #[test]
    fn test_falling_edge_reports_last_positive() {
        let mut db = debouncer(1, 2);

        db.feed(pos(5));
        db.feed(pos(6));
        db.feed(Signal::Negative);
        let edge = db.feed(Signal::Negative);

        match edge {
            Some(Edge::Falling { last_positive }) => assert_eq!(last_positive.frame_index, 6),
            other => panic!("expected falling edge, got {:?}", other),
        }
        assert_eq!(db.current_state(), &DebouncedState::Inactive);
    }

    #[test]
    fn test_uncertain_keeps_state() {
        let mut db = debouncer(2, 2);

        db.feed(pos(0));
        db.feed(Signal::Uncertain);
        assert!(matches!(
            db.current_state(),
            DebouncedState::PendingActive { count: 1, .. }
        ));

        db.feed(pos(2));
        db.feed(Signal::Uncertain);
        db.feed(Signal::Uncertain);
        assert!(matches!(db.current_state(), DebouncedState::Active { .. }));

        db.feed(Signal::Negative);
        db.feed(Signal::Uncertain);
        assert!(matches!(
            db.current_state(),
            DebouncedState::PendingInactive { count: 1, .. }
        ));
    }

    #[test]
    fn test_identical_streams_below_threshold_never_edge() {
        for threshold in 2..=5 {
            let mut db = debouncer(threshold, threshold);
            for frame in 0..(threshold as u64 - 1) {
                assert_eq!(db.feed(pos(frame)), None);
            }

            let mut db = debouncer(threshold, threshold);
            for _ in 0..(threshold * 4) {
                assert_eq!(db.feed(Signal::Negative), None);
            }
        }
    }

    #[test]
    fn test_reset() {
        let mut db = debouncer(1, 1);
        assert!(db.feed(pos(0)).is_some());
        assert_ne!(db.current_state(), &DebouncedState::Inactive);

        db.reset();

        assert_eq!(db.current_state(), &DebouncedState::Inactive);
        assert!(db.feed(pos(1)).is_some());
    }
}
