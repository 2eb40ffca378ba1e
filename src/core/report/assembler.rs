use log::debug;

use crate::core::error::MarkerError;
use crate::core::markers::Interval;
use crate::core::report::row::{ReportRow, TimeRange};
use crate::core::scenes::SceneMapper;

/// Stateless join of intervals with the scene table.
pub struct ReportAssembler<'a> {
    mapper: &'a SceneMapper,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(mapper: &'a SceneMapper) -> Self {
        Self { mapper }
    }

    pub fn row_for(&self, interval: Interval) -> Result<ReportRow, MarkerError> {
        let scene = self.mapper.map(&interval)?;
        debug!(
            "{} [{}, {}] -> scene {}",
            interval.marker, interval.start_frame, interval.end_frame, scene.scene_id
        );

        Ok(ReportRow {
            marker: interval.marker,
            scene_id: scene.scene_id,
            scene_relative_range: TimeRange {
                start: scene.relative_start,
                end: scene.relative_end,
            },
            absolute_range: TimeRange {
                start: interval.start_time,
                end: interval.end_time,
            },
            thumbnail_frame_index: (interval.start_frame + interval.end_frame) / 2,
            frame_in: interval.start_frame,
            frame_out: interval.frame_out(),
            truncated: interval.truncated,
            cross_scene: scene.cross_scene,
            clamped: scene.clamped,
            source_tc_in: interval.source_tc_in,
            source_tc_out: interval.source_tc_out,
            label: interval.label,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::UnmappedIntervalPolicy;
    use crate::core::markers::MarkerType;
    use crate::core::report::row::sort_rows;
    use crate::core::scenes::SceneBoundary;
    use std::time::Duration;

    fn interval(marker: MarkerType, start_frame: u64, end_frame: u64) -> Interval {
        Interval {
            marker,
            start_frame,
            end_frame,
            start_time: Duration::from_millis(start_frame * 40),
            end_time: Duration::from_millis(end_frame * 40),
            truncated: false,
            label: Some(format!("{} {}", marker, start_frame)),
            source_tc_in: None,
            source_tc_out: None,
        }
    }

    fn mapper(policy: UnmappedIntervalPolicy) -> SceneMapper {
        SceneMapper::new(SceneBoundary::from_cut_frames(&[10, 100, 200], 25.0).unwrap(), policy).unwrap()
    }

    fn sorted_rows(mapper: &SceneMapper, intervals: Vec<Interval>) -> Vec<ReportRow> {
        let assembler = ReportAssembler::new(mapper);
        let mut rows: Vec<ReportRow> = intervals
            .into_iter()
            .map(|i| assembler.row_for(i).unwrap())
            .collect();
        sort_rows(&mut rows);
        rows
    }

    #[test]
    fn test_row_fields() {
        let mapper = mapper(UnmappedIntervalPolicy::Clamp);
        let row = ReportAssembler::new(&mapper)
            .row_for(interval(MarkerType::Vfx, 110, 121))
            .unwrap();

        assert_eq!(row.scene_id, 1);
        assert_eq!(row.thumbnail_frame_index, 115);
        assert_eq!(row.frame_in, 110);
        assert_eq!(row.frame_out, 122);
        assert_eq!(row.scene_relative_range.start, Duration::from_millis(400));
        assert_eq!(row.absolute_range.end, Duration::from_millis(121 * 40));
        assert_eq!(row.label.as_deref(), Some("VFX 110"));
    }

    #[test]
    fn test_rows_grouped_by_scene_marker_then_time() {
        let mapper = mapper(UnmappedIntervalPolicy::Clamp);
        let intervals = vec![
            interval(MarkerType::Adr, 150, 160),
            interval(MarkerType::Vfx, 210, 220),
            interval(MarkerType::Vfx, 130, 140),
            interval(MarkerType::Adr, 20, 30),
            interval(MarkerType::Vfx, 105, 110),
            interval(MarkerType::Adr, 101, 102),
        ];

        let rows = sorted_rows(&mapper, intervals);

        let order: Vec<(u32, MarkerType, u64)> = rows
            .iter()
            .map(|r| (r.scene_id, r.marker, r.frame_in))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, MarkerType::Adr, 20),
                (1, MarkerType::Vfx, 105),
                (1, MarkerType::Vfx, 130),
                (1, MarkerType::Adr, 101),
                (1, MarkerType::Adr, 150),
                (2, MarkerType::Vfx, 210),
            ]
        );

        for pair in rows.windows(2) {
            if pair[0].scene_id == pair[1].scene_id && pair[0].marker == pair[1].marker {
                assert!(pair[0].absolute_range.start < pair[1].absolute_range.start);
            }
        }
    }

    #[test]
    fn test_overlapping_markers_yield_independent_rows() {
        let mapper = mapper(UnmappedIntervalPolicy::Clamp);
        let rows = sorted_rows(
            &mapper,
            vec![
                interval(MarkerType::Adr, 130, 150),
                interval(MarkerType::Vfx, 120, 180),
            ],
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].marker, MarkerType::Vfx);
        assert_eq!(rows[1].marker, MarkerType::Adr);
        assert_eq!(rows[0].scene_id, rows[1].scene_id);
    }

    #[test]
    fn test_unmapped_interval_fails_under_fail_policy() {
        let mapper = mapper(UnmappedIntervalPolicy::Fail);
        let assembler = ReportAssembler::new(&mapper);

        assert!(matches!(
            assembler.row_for(interval(MarkerType::Vfx, 2, 8)),
            Err(MarkerError::UnmappedInterval { start_frame: 2, .. })
        ));
        assert_eq!(assembler.row_for(interval(MarkerType::Vfx, 12, 18)).unwrap().scene_id, 0);
    }
}
