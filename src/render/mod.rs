pub mod batch;
pub mod context;
pub mod document;
pub mod engine;
pub mod finalize;
pub mod sections;
pub mod severity;
pub mod sink;
pub mod theme;
pub mod writer;

pub use batch::{BatchOptions, BatchOutcome, BatchRenderer, BatchReport};
pub use document::{asset_keys, layout_document, Document, DocumentInfo, DocumentOptions};
pub use engine::{EngineOptions, ReportEngine};
pub use sink::{report_filename, OutputSink, RenderOutput};
pub use writer::write_pdf;
