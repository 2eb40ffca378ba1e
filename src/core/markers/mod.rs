//! 标记区间提取 - 把逐帧 OCR 读数整理成干净的时间区间
//!
//! 核心策略：
//! 1. 置信度门限 - 低置信度读数视为"无信息"，不参与翻转
//! 2. 状态机去抖 - 连续确认才切换激活状态
//! 3. 区间回溯 - 起点回溯到首个正读数，终点回溯到最后一个正读数
//! 4. 多帧投票 - 区间文字取各帧识别结果的逐列众数

pub mod accumulator;
pub mod debouncer;
pub mod label;
pub mod reading;
pub mod track;

pub use accumulator::{Interval, IntervalAccumulator};
pub use debouncer::{DebounceConfig, DebouncedState, Edge, SignalDebouncer};
pub use label::{consensus, detect_markers, match_marker_line};
pub use reading::{Detection, FrameMark, FrameReading, MarkerType, Signal, SignalGate};
pub use track::MarkerTrack;
