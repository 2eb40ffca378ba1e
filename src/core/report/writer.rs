use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::core::error::ReportError;
use crate::core::report::row::ReportRow;
use crate::core::video::{frame_base, Timecode};

/// Run-level facts a writer may need besides the rows.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub fps: f64,
    pub source_name: Option<String>,
}

impl ReportContext {
    pub fn new(fps: f64) -> Self {
        Self {
            fps,
            source_name: None,
        }
    }

    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

/// Consumer of the final, ordered rows (spreadsheet, JSON, ...).
pub trait ReportWriter {
    fn write(&mut self, rows: &[ReportRow], ctx: &ReportContext) -> Result<(), ReportError>;
}

#[derive(Serialize)]
struct RowRecord<'a> {
    #[serde(flatten)]
    row: &'a ReportRow,
    tc_in: Timecode,
    tc_out: Timecode,
    scene_tc_in: Timecode,
    scene_tc_out: Timecode,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    source: Option<&'a str>,
    fps: f64,
    row_count: usize,
    rows: Vec<RowRecord<'a>>,
}

/// JSON report; every time range is also rendered as HH:MM:SS:FF at the
/// movie frame rate. Out timecodes are exclusive, like `frame_out`.
pub struct JsonReportWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonReportWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let file = File::create(path.as_ref())?;
        info!("📝 Writing report to {:?}", path.as_ref());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ReportWriter for JsonReportWriter<W> {
    fn write(&mut self, rows: &[ReportRow], ctx: &ReportContext) -> Result<(), ReportError> {
        let fps = ctx.fps;
        let base = frame_base(fps);
        let document = ReportDocument {
            source: ctx.source_name.as_deref(),
            fps,
            row_count: rows.len(),
            rows: rows
                .iter()
                .map(|row| RowRecord {
                    row,
                    tc_in: Timecode::from_frame_index(row.frame_in, base),
                    tc_out: Timecode::from_frame_index(row.frame_out, base),
                    scene_tc_in: Timecode::from_duration(row.scene_relative_range.start, fps),
                    scene_tc_out: Timecode::from_duration(row.scene_relative_range.end, fps)
                        .add_frames(1, base),
                })
                .collect(),
        };

        serde_json::to_writer_pretty(&mut self.out, &document)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::markers::MarkerType;
    use crate::core::report::row::TimeRange;
    use std::time::Duration;

    fn row() -> ReportRow {
        ReportRow {
            marker: MarkerType::Adr,
            scene_id: 3,
            scene_relative_range: TimeRange {
                start: Duration::from_millis(500),
                end: Duration::from_secs(2),
            },
            absolute_range: TimeRange {
                start: Duration::from_secs(60),
                end: Duration::from_millis(61_500),
            },
            thumbnail_frame_index: 1458,
            frame_in: 1440,
            frame_out: 1477,
            label: Some("ADR 12 breath".to_string()),
            truncated: false,
            cross_scene: true,
            clamped: false,
            source_tc_in: Timecode::parse_ocr("10:00:01:00", 24),
            source_tc_out: None,
        }
    }

    #[test]
    fn test_json_document_shape() {
        let mut writer = JsonReportWriter::new(Vec::new());
        let ctx = ReportContext::new(24.0).with_source_name("reel_02.mov");
        writer.write(&[row()], &ctx).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&writer.into_inner()).unwrap();
        assert_eq!(value["row_count"], 1);
        assert_eq!(value["source"], "reel_02.mov");

        let first = &value["rows"][0];
        assert_eq!(first["marker"], "ADR");
        assert_eq!(first["scene_id"], 3);
        assert_eq!(first["absolute_range"]["start_ms"], 60_000);
        assert_eq!(first["scene_relative_range"]["end_ms"], 2_000);
        assert_eq!(first["tc_in"], "00:01:00:00");
        assert_eq!(first["frame_out"], 1477);
        assert_eq!(first["tc_out"], "00:01:01:13");
        assert_eq!(first["scene_tc_in"], "00:00:00:12");
        assert_eq!(first["scene_tc_out"], "00:00:02:01");
        assert_eq!(first["source_tc_in"], "10:00:01:00");
        assert!(first["source_tc_out"].is_null());
        assert_eq!(first["cross_scene"], true);
        assert_eq!(first["label"], "ADR 12 breath");
    }

    #[test]
    fn test_empty_report() {
        let mut writer = JsonReportWriter::new(Vec::new());
        writer.write(&[], &ReportContext::new(25.0)).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&writer.into_inner()).unwrap();
        assert_eq!(value["row_count"], 0);
        assert!(value["source"].is_null());
        assert_eq!(value["rows"].as_array().map(Vec::len), Some(0));
    }
}
