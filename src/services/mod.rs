//! Business logic services.
//!
//! Services orchestrate repositories and external collaborators and are
//! resolved from the application context via `FromRef`.

mod run;
mod sync;

pub use run::{RecordOutcome, StepOutcome, SyncRun};
pub use sync::{SyncService, SyncSummary};
