//! Mock paginated data API
//!
//! This module provides:
//! - Page request/response types
//! - An in-process mock with latency and random failures
//! - An axum HTTP server exposing the mock
//! - A reqwest client page source

pub mod client;
pub mod mock;
pub mod page;
pub mod server;

pub use client::HttpPageSource;
pub use mock::{MockApi, MockApiConfig};
pub use page::{DEFAULT_TOTAL_COUNT, InitialPage, LOAD_LIMIT, Page, PageRequest, initial_page};
pub use server::{AppState, DEFAULT_ADDR, router, run_serve, run_serve_on_listener, spawn_local};
