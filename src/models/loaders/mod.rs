pub mod text_loader;

pub use text_loader::{list_documents, TextDocumentOpener};
