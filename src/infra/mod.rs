//! Infrastructure layer
//!
//! Handles all I/O operations: network, filesystem, archives, and external
//! processes.

pub mod archive;
pub mod download;
pub mod filesystem;
pub mod toolchain;
