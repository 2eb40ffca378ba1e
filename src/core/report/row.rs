use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::core::markers::MarkerType;
use crate::core::video::Timecode;

fn as_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    #[serde(rename = "start_ms", serialize_with = "as_millis")]
    pub start: Duration,
    #[serde(rename = "end_ms", serialize_with = "as_millis")]
    pub end: Duration,
}

/// 报表中的一行，对应一个标记区间
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub marker: MarkerType,
    pub scene_id: u32,
    pub scene_relative_range: TimeRange,
    pub absolute_range: TimeRange,
    /// Frame the writer should render as the row's picture.
    pub thumbnail_frame_index: u64,
    pub frame_in: u64,
    /// Exclusive.
    pub frame_out: u64,
    pub label: Option<String>,
    pub truncated: bool,
    pub cross_scene: bool,
    pub clamped: bool,
    pub source_tc_in: Option<Timecode>,
    pub source_tc_out: Option<Timecode>,
}

/// Writer contract: scene, then marker type, then start time.
pub fn sort_rows(rows: &mut [ReportRow]) {
    rows.sort_by(|a, b| {
        a.scene_id
            .cmp(&b.scene_id)
            .then(a.marker.cmp(&b.marker))
            .then(a.absolute_range.start.cmp(&b.absolute_range.start))
    });
}
