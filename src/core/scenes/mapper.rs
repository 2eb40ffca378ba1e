use std::time::Duration;

use log::{debug, warn};

use crate::core::config::UnmappedIntervalPolicy;
use crate::core::error::MarkerError;
use crate::core::markers::Interval;

/// 场景起点（由外部镜头切分工具提供）
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBoundary {
    pub scene_id: u32,
    pub start_frame: u64,
    pub start_time: Duration,
}

impl SceneBoundary {
    /// Builds a table from the cut frames a scene detector reports.
    /// Scene ids are assigned in order starting at 0.
    pub fn from_cut_frames(cuts: &[u64], fps: f64) -> Result<Vec<SceneBoundary>, MarkerError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(MarkerError::InvalidSceneTable(format!("frame rate {} is not positive", fps)));
        }
        cuts.iter()
            .enumerate()
            .map(|(i, &frame)| {
                let start_time = Duration::try_from_secs_f64(frame as f64 / fps).map_err(|e| {
                    MarkerError::InvalidSceneTable(format!("cut at frame {}: {}", frame, e))
                })?;
                Ok(SceneBoundary {
                    scene_id: i as u32,
                    start_frame: frame,
                    start_time,
                })
            })
            .collect()
    }
}

/// Where an interval lands in the scene table.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAssignment {
    pub scene_id: u32,
    pub relative_start: Duration,
    pub relative_end: Duration,
    /// The interval ends in a later scene than it starts.
    pub cross_scene: bool,
    /// The interval starts before the first boundary and was pinned to it.
    pub clamped: bool,
}

pub struct SceneMapper {
    scenes: Vec<SceneBoundary>,
    policy: UnmappedIntervalPolicy,
}

impl SceneMapper {
    /// Validates the table: non-empty and strictly increasing in both frame
    /// and time, which the binary search below relies on.
    pub fn new(scenes: Vec<SceneBoundary>, policy: UnmappedIntervalPolicy) -> Result<Self, MarkerError> {
        if scenes.is_empty() {
            return Err(MarkerError::InvalidSceneTable("no scene boundaries".into()));
        }
        for (i, pair) in scenes.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start_frame <= prev.start_frame || next.start_time <= prev.start_time {
                return Err(MarkerError::InvalidSceneTable(format!(
                    "boundary {} (scene {}, frame {}) does not follow boundary {} (scene {}, frame {})",
                    i + 1,
                    next.scene_id,
                    next.start_frame,
                    i,
                    prev.scene_id,
                    prev.start_frame
                )));
            }
        }
        debug!("SceneMapper: {} scenes", scenes.len());
        Ok(Self { scenes, policy })
    }

    /// One scene covering the whole movie, for runs without a cut list.
    pub fn whole_movie(policy: UnmappedIntervalPolicy) -> Self {
        Self {
            scenes: vec![SceneBoundary {
                scene_id: 0,
                start_frame: 0,
                start_time: Duration::ZERO,
            }],
            policy,
        }
    }

    pub fn scenes(&self) -> &[SceneBoundary] {
        &self.scenes
    }

    /// Index of the last boundary at or before `frame`.
    fn scene_index(&self, frame: u64) -> Option<usize> {
        self.scenes
            .partition_point(|s| s.start_frame <= frame)
            .checked_sub(1)
    }

    pub fn map(&self, interval: &Interval) -> Result<SceneAssignment, MarkerError> {
        let (index, clamped) = match self.scene_index(interval.start_frame) {
            Some(index) => (index, false),
            None => match self.policy {
                UnmappedIntervalPolicy::Clamp => {
                    warn!(
                        "{} interval at frame {} precedes the first scene, clamping",
                        interval.marker, interval.start_frame
                    );
                    (0, true)
                }
                UnmappedIntervalPolicy::Fail => {
                    return Err(MarkerError::UnmappedInterval {
                        start_frame: interval.start_frame,
                        first_scene_frame: self.scenes[0].start_frame,
                    })
                }
            },
        };

        let scene = &self.scenes[index];
        let cross_scene = self
            .scene_index(interval.end_frame)
            .is_some_and(|end_index| end_index > index);

        Ok(SceneAssignment {
            scene_id: scene.scene_id,
            relative_start: interval.start_time.saturating_sub(scene.start_time),
            relative_end: interval.end_time.saturating_sub(scene.start_time),
            cross_scene,
            clamped,
        })
    }
}
