pub mod frame;
pub mod prefilter;
pub mod reader;
pub mod source;
pub mod timecode;

pub use frame::{crop_region, RawFrame, Region};
pub use prefilter::{BrightGlyphPrefilter, TextPrefilter, TextPresence};
pub use reader::{FrameSignalReader, ReaderStats, ReadingStream};
pub use source::{FrameSource, OcrEngine, Recognition};
pub use timecode::{frame_base, Timecode};
