//! Resolution services shared across clients.

mod applier;
mod batch;
mod conflicts;

pub use applier::ResolutionApplier;
pub use batch::BatchOutcome;
pub use conflicts::{ConflictService, DEFAULT_HISTORY_LIMIT};
