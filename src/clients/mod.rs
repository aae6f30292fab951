pub mod backend;
pub mod dedup;
pub mod generation_client;

pub use backend::{GenerationBackend, GenerationRequest};
pub use dedup::{DedupGuard, DEDUP_WINDOW};
pub use generation_client::RequestClient;
