//! 运行配置 - 阈值与策略一次性加载，之后只读
//!
//! 配置文件为 JSON5，所有字段可省略：
//!
//! ```json5
//! {
//!   sampling_stride: 2,
//!   activate_threshold: 2,
//!   deactivate_threshold: 3,
//!   min_confidence: 0.6,
//!   on_read_error: "skip",
//!   text_region: { x: 0, y: 880, width: 960, height: 200 },
//! }
//! ```

use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::core::error::MarkerError;
use crate::core::video::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadErrorPolicy {
    Abort,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedIntervalPolicy {
    Clamp,
    Fail,
}

/// What a detection below `min_confidence` means to the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowConfidencePolicy {
    /// Treated as "no information": neither confirms nor cancels a run.
    Ignore,
    /// Treated like an explicit negative.
    Negative,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub sampling_stride: u64,
    pub activate_threshold: u32,
    pub deactivate_threshold: u32,
    pub min_confidence: f32,
    pub on_read_error: ReadErrorPolicy,
    pub unmapped_interval_policy: UnmappedIntervalPolicy,
    pub low_confidence_policy: LowConfidencePolicy,
    pub start_frame: u64,
    pub batch_size: usize,
    pub ocr_workers: usize,
    pub min_text_pixels: u32,
    pub glyph_luma_threshold: u8,
    pub text_region: Option<Region>,
    pub timecode_region: Option<Region>,
    pub thumbnail_scale: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sampling_stride: 1,
            activate_threshold: 2,
            deactivate_threshold: 3,
            min_confidence: 0.6,
            on_read_error: ReadErrorPolicy::Skip,
            unmapped_interval_policy: UnmappedIntervalPolicy::Clamp,
            low_confidence_policy: LowConfidencePolicy::Ignore,
            start_frame: 0,
            batch_size: 32,
            ocr_workers: num_cpus::get().max(1),
            min_text_pixels: 2000,
            glyph_luma_threshold: 245,
            text_region: None,
            timecode_region: None,
            thumbnail_scale: 0.25,
        }
    }
}

impl RunConfig {
    /// 标记常被画面遮挡、OCR 抖动较大的片源
    pub fn for_noisy_ocr() -> Self {
        Self {
            activate_threshold: 3,
            deactivate_threshold: 5,
            min_confidence: 0.5,
            ..Default::default()
        }
    }

    /// 隔帧采样：每个采样点覆盖的时间更长，确认所需的读数更少
    pub fn for_sparse_sampling(stride: u64) -> Self {
        Self {
            sampling_stride: stride.max(1),
            activate_threshold: 1,
            deactivate_threshold: 2,
            ..Default::default()
        }
    }

    pub fn from_json5_str(source: &str) -> Result<Self, MarkerError> {
        let config: RunConfig = json5::from_str(source)?;
        config.validate()?;
        debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MarkerError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_json5_str(&source)
    }

    pub fn validate(&self) -> Result<(), MarkerError> {
        if self.sampling_stride == 0 {
            return Err(MarkerError::Config("sampling_stride must be >= 1".into()));
        }
        if self.activate_threshold == 0 || self.deactivate_threshold == 0 {
            return Err(MarkerError::Config(
                "activate_threshold and deactivate_threshold must be >= 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(MarkerError::Config(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.batch_size == 0 || self.ocr_workers == 0 {
            return Err(MarkerError::Config(
                "batch_size and ocr_workers must be >= 1".into(),
            ));
        }
        if !(self.thumbnail_scale > 0.0 && self.thumbnail_scale <= 1.0) {
            return Err(MarkerError::Config(format!(
                "thumbnail_scale must be within (0, 1], got {}",
                self.thumbnail_scale
            )));
        }
        for (name, region) in [
            ("text_region", self.text_region),
            ("timecode_region", self.timecode_region),
        ] {
            if let Some(region) = region {
                if region.is_empty() {
                    return Err(MarkerError::Config(format!("{} has zero area", name)));
                }
            }
        }
        Ok(())
    }
}
