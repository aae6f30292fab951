pub mod accumulator;
pub mod batch;
pub mod document;
pub mod event;
pub mod loaders;
pub mod position;
pub mod record;
pub mod selection;

pub use accumulator::AccumulatedOutput;
pub use batch::{Batch, Section};
pub use document::{DocumentOpener, DocumentSource, PagedTextDocument};
pub use event::{EventSink, LogLevel, ProgressEvent};
pub use loaders::{list_documents, TextDocumentOpener};
pub use position::{ProcessingPosition, ResumePoint};
pub use record::{ContentKind, Difficulty, Mcq, Record, ShortNote};
pub use selection::parse_selection;
