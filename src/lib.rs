//! fwforge - Buildroot front end for PixelPilot firmware images
//!
//! Fetches a pinned Buildroot release, applies a board defconfig, runs a
//! full or fast incremental build, and packages the resulting images with
//! MD5 checksums.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Orchestration logic
//! - [`infra`] - Infrastructure layer (network, filesystem, processes)
//! - [`config`] - Built-in defaults
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
