//! HH:MM:SS:FF timecode at an integer frame base.

use std::fmt;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

static TWO_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timecode {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub frames: u32,
}

/// Integer frame base for a container rate: 23.976 counts as 24, 29.97 as 30.
pub fn frame_base(fps: f64) -> u32 {
    if fps.is_finite() && fps >= 1.0 {
        fps.round() as u32
    } else {
        1
    }
}

impl Timecode {
    pub fn from_frame_index(frame_index: u64, base: u32) -> Self {
        let base = base.max(1) as u64;
        let per_minute = base * 60;
        let per_hour = per_minute * 60;

        let hours = frame_index / per_hour;
        let rest = frame_index % per_hour;
        let minutes = rest / per_minute;
        let rest = rest % per_minute;

        Self {
            hours: hours as u32,
            minutes: minutes as u32,
            seconds: (rest / base) as u32,
            frames: (rest % base) as u32,
        }
    }

    pub fn from_duration(time: Duration, fps: f64) -> Self {
        let frame_index = (time.as_secs_f64() * fps).round() as u64;
        Self::from_frame_index(frame_index, frame_base(fps))
    }

    pub fn to_frame_index(&self, base: u32) -> u64 {
        let base = base.max(1) as u64;
        ((self.hours as u64 * 60 + self.minutes as u64) * 60 + self.seconds as u64) * base
            + self.frames as u64
    }

    pub fn add_frames(&self, count: u64, base: u32) -> Self {
        Self::from_frame_index(self.to_frame_index(base) + count, base)
    }

    /// Reads a burned-in timecode out of OCR text.
    ///
    /// OCR tends to drop or mangle the separators, so only the first four
    /// two-digit groups are used, e.g. `"01 02:03.04"` -> `01:02:03:04`.
    /// A frames field at or above `base` is a misread and yields `None`.
    pub fn parse_ocr(text: &str, base: u32) -> Option<Self> {
        let joined: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let groups: Vec<u32> = TWO_DIGITS
            .find_iter(&joined)
            .take(4)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();

        if groups.len() < 4 {
            return None;
        }
        let (hours, minutes, seconds, frames) = (groups[0], groups[1], groups[2], groups[3]);
        if minutes >= 60 || seconds >= 60 || frames >= base.max(1) {
            return None;
        }
        Some(Self {
            hours,
            minutes,
            seconds,
            frames,
        })
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

impl Serialize for Timecode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
