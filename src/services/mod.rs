pub mod output_writer;
pub mod repair;
pub mod state_store;

pub use output_writer::OutputWriter;
pub use repair::{RepairEngine, RepairFailure, RepairStage, RepairStats};
pub use state_store::StateStore;
