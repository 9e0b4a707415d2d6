//! Page request and response types shared by the mock API, the HTTP client
//! and the loader.

use serde::{Deserialize, Serialize};

/// Items per page requested by the loader
pub const LOAD_LIMIT: u32 = 20;

/// Total number of items the mock feed pretends to have
pub const DEFAULT_TOTAL_COUNT: u64 = 200;

fn default_limit() -> u32 {
    LOAD_LIMIT
}

/// A request for one page of items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub skip: u64,
}

impl PageRequest {
    pub fn new(limit: u32, skip: u64) -> Self {
        Self { limit, skip }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(LOAD_LIMIT, 0)
    }
}

/// One page of items plus the size of the whole feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<u64>,
    pub total_count: u64,
}

impl Page {
    /// Build the page for `request`: the consecutive ids `skip..skip + limit`.
    pub fn for_request(request: &PageRequest, total_count: u64) -> Self {
        let start = request.skip;
        let end = start.saturating_add(u64::from(request.limit));
        Self {
            items: (start..end).collect(),
            total_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The first page shipped with the initial page load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialPage {
    pub items: Vec<u64>,
}

/// Items rendered before any scroll happens
pub fn initial_page() -> InitialPage {
    InitialPage {
        items: (0..u64::from(LOAD_LIMIT)).collect(),
    }
}
