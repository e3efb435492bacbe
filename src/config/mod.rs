//! Configuration and constants
//!
//! - [`defaults`] - Built-in default values
//! - [`urls`] - Upstream download locations

pub mod defaults;
pub mod urls;
