use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::core::config::{LowConfidencePolicy, RunConfig};
use crate::core::video::Timecode;

/// 标记类型（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum MarkerType {
    #[serde(rename = "VFX")]
    Vfx,
    #[serde(rename = "ADR")]
    Adr,
}

impl MarkerType {
    pub const ALL: [MarkerType; 2] = [MarkerType::Vfx, MarkerType::Adr];

    /// Text the on-screen cue starts with.
    pub fn prefix(&self) -> &'static str {
        match self {
            MarkerType::Vfx => "VFX",
            MarkerType::Adr => "ADR",
        }
    }
}

impl fmt::Display for MarkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// 单帧中某个标记的识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub present: bool,
    pub confidence: f32,
    /// Matched marker text, e.g. `"VFX 042 sky replacement"`.
    pub text: Option<String>,
}

impl Detection {
    pub fn absent(confidence: f32) -> Self {
        Self {
            present: false,
            confidence,
            text: None,
        }
    }

    pub fn found(confidence: f32, text: impl Into<String>) -> Self {
        Self {
            present: true,
            confidence,
            text: Some(text.into()),
        }
    }
}

/// Position of a reading in the movie.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMark {
    pub frame_index: u64,
    pub timestamp: Duration,
    pub source_timecode: Option<Timecode>,
}

/// 每个采样帧产生一次，处理完即丢弃
#[derive(Debug, Clone)]
pub struct FrameReading {
    pub frame_index: u64,
    pub timestamp: Duration,
    /// A marker missing from the map was not evaluated on this frame.
    pub detections: BTreeMap<MarkerType, Detection>,
    pub source_timecode: Option<Timecode>,
}

impl FrameReading {
    pub fn new(frame_index: u64, timestamp: Duration) -> Self {
        Self {
            frame_index,
            timestamp,
            detections: BTreeMap::new(),
            source_timecode: None,
        }
    }

    pub fn with_detection(mut self, marker: MarkerType, detection: Detection) -> Self {
        self.detections.insert(marker, detection);
        self
    }

    pub fn mark(&self) -> FrameMark {
        FrameMark {
            frame_index: self.frame_index,
            timestamp: self.timestamp,
            source_timecode: self.source_timecode,
        }
    }
}

/// A reading reduced to what the debouncer cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Positive(FrameMark),
    Negative,
    /// Low-confidence or missing detection: counts neither way.
    Uncertain,
}

/// Gate applied to each detection before it reaches a debouncer.
#[derive(Debug, Clone, Copy)]
pub struct SignalGate {
    min_confidence: f32,
    low_confidence: LowConfidencePolicy,
}

impl SignalGate {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
            low_confidence: config.low_confidence_policy,
        }
    }

    pub fn classify(&self, reading: &FrameReading, marker: MarkerType) -> Signal {
        match reading.detections.get(&marker) {
            None => Signal::Uncertain,
            Some(d) if !d.present => Signal::Negative,
            Some(d) if d.confidence >= self.min_confidence => Signal::Positive(reading.mark()),
            Some(_) => match self.low_confidence {
                LowConfidencePolicy::Ignore => Signal::Uncertain,
                LowConfidencePolicy::Negative => Signal::Negative,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(detection: Option<Detection>) -> FrameReading {
        let reading = FrameReading::new(3, Duration::from_millis(125));
        match detection {
            Some(d) => reading.with_detection(MarkerType::Vfx, d),
            None => reading,
        }
    }

    #[test]
    fn test_classify_confidence_gate() {
        let gate = SignalGate::new(&RunConfig::default());

        assert!(matches!(
            gate.classify(&reading(Some(Detection::found(0.9, "VFX 1"))), MarkerType::Vfx),
            Signal::Positive(FrameMark { frame_index: 3, .. })
        ));
        assert_eq!(
            gate.classify(&reading(Some(Detection::found(0.2, "VFX 1"))), MarkerType::Vfx),
            Signal::Uncertain
        );
        assert_eq!(
            gate.classify(&reading(Some(Detection::absent(0.9))), MarkerType::Vfx),
            Signal::Negative
        );
        assert_eq!(gate.classify(&reading(None), MarkerType::Vfx), Signal::Uncertain);
        assert_eq!(
            gate.classify(&reading(Some(Detection::found(0.9, "VFX 1"))), MarkerType::Adr),
            Signal::Uncertain
        );
    }

    #[test]
    fn test_classify_low_confidence_as_negative() {
        let config = RunConfig {
            low_confidence_policy: LowConfidencePolicy::Negative,
            ..Default::default()
        };
        let gate = SignalGate::new(&config);
        assert_eq!(
            gate.classify(&reading(Some(Detection::found(0.2, "VFX 1"))), MarkerType::Vfx),
            Signal::Negative
        );
    }

    #[test]
    fn test_marker_order_and_display() {
        assert!(MarkerType::Vfx < MarkerType::Adr);
        assert_eq!(MarkerType::Adr.to_string(), "ADR");
    }
}
