pub mod assembler;
pub mod row;
pub mod thumbnail;
pub mod writer;

pub use assembler::ReportAssembler;
pub use row::{sort_rows, ReportRow, TimeRange};
pub use thumbnail::ThumbnailExporter;
pub use writer::{JsonReportWriter, ReportContext, ReportWriter};
