//! Infinite-scroll loading
//!
//! - `state`: the READY / LOADING / COMPLETE / ERROR state machine
//! - `guard`: burst detection and cooldown for load triggers
//! - `infinite`: the host that drives a page source through both

pub mod guard;
pub mod infinite;
pub mod state;

pub use guard::{LoopGuard, LoopGuardConfig, LoopTrackerSnapshot};
pub use infinite::{InfiniteLoader, LoadOutcome, PageSource, SkipReason};
pub use state::{LoadStatus, LoaderState};
