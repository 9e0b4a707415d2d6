//! Loader state machine
//!
//! Tracks where an infinite list is in its load cycle. The host flips the
//! status to `Loading` before a fetch and reports the outcome through
//! [`LoaderState::loaded`], [`LoaderState::complete`] or [`LoaderState::error`].

use serde::{Deserialize, Serialize};

/// Status of the loader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoadStatus {
    /// Idle, another page may be requested
    #[default]
    Ready,
    /// A page request is in flight
    Loading,
    /// Every item has been loaded
    Complete,
    /// The last page request failed
    Error,
}

impl LoadStatus {
    /// Short label used in CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Ready => "READY",
            LoadStatus::Loading => "LOADING",
            LoadStatus::Complete => "COMPLETE",
            LoadStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loader state shared between the list host and the code that fetches pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderState {
    /// Current status
    pub status: LoadStatus,
    /// True until the first `loaded()` or `complete()`; only `reset()` sets it back
    pub is_first_load: bool,
    /// Whether the host list is mounted
    pub mounted: bool,
}

impl LoaderState {
    pub fn new() -> Self {
        Self {
            status: LoadStatus::Ready,
            is_first_load: true,
            mounted: false,
        }
    }

    /// A page arrived and more may follow
    pub fn loaded(&mut self) {
        if self.is_first_load {
            self.is_first_load = false;
        }
        self.status = LoadStatus::Ready;
    }

    /// The last page arrived
    pub fn complete(&mut self) {
        if self.is_first_load {
            self.is_first_load = false;
        }
        self.status = LoadStatus::Complete;
    }

    /// Back to a fresh list
    pub fn reset(&mut self) {
        self.is_first_load = true;
        self.status = LoadStatus::Ready;
    }

    /// The page request failed. `is_first_load` is left alone.
    pub fn error(&mut self) {
        self.status = LoadStatus::Error;
    }

    /// Mark a page request as in flight
    pub fn start_loading(&mut self) {
        self.status = LoadStatus::Loading;
    }

    pub fn set_mounted(&mut self, mounted: bool) {
        self.mounted = mounted;
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn is_complete(&self) -> bool {
        self.status == LoadStatus::Complete
    }

    pub fn is_error(&self) -> bool {
        self.status == LoadStatus::Error
    }

    /// Returns true if a new page request may start
    pub fn can_load(&self) -> bool {
        self.status == LoadStatus::Ready
    }
}

impl Default for LoaderState {
    fn default() -> Self {
        Self::new()
    }
}
