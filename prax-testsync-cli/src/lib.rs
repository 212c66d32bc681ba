//! Prax TestSync CLI - Command-line interface for the test database synchronizer.
//!
//! This crate provides the `prax-testsync` tool. It reads a connection
//! registry from `prax-testsync.toml` and keeps the test databases it
//! describes migrated and empty.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
