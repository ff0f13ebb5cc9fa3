//! Keel CLI - command-line interface for Keel migrations.
//!
//! This crate provides the `keel` binary: applying, creating, listing,
//! rolling back and merging migrations stored in a directory.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
