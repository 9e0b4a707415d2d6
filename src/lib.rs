//! scrollfeed - the non-UI half of an infinite-scroll list
//!
//! A loader state machine with a loop guard against runaway triggers, a mock
//! paginated API that is slow and occasionally fails, and a calendar week
//! generator.

pub mod api;
pub mod calendar;
pub mod error;
pub mod loader;

pub use error::{FeedError, Result};
