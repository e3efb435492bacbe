//! Core orchestration logic
//!
//! Decides which build steps run, in what order, and how to react to their
//! outcome. Process and network side effects live in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`request`] - The immutable build request
//! - [`config`] - Project configuration (`fwforge.toml`)
//! - [`provision`] - Buildroot source provisioning
//! - [`build_system`] - Build-system collaborator interface
//! - [`configure`] - Defconfig application
//! - [`resolver`] - Fast rebuild package resolution
//! - [`orchestrator`] - Build dispatch
//! - [`packager`] - Artifact packaging and digests

pub mod build_system;
pub mod config;
pub mod configure;
pub mod orchestrator;
pub mod packager;
pub mod provision;
pub mod request;
pub mod resolver;
