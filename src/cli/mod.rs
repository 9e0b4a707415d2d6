//! CLI module for scrollfeed - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for the mock API server,
//! feed scrolling, and calendar generation.

pub mod commands;

pub use commands::Cli;
