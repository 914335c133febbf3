//! Stevedore: declarative bootstrapper for docker-compose clusters.
//!
//! Resolves project and cluster workdirs, materializes literal files, writes
//! one compose descriptor per cluster, creates bind-mount host directories,
//! generates an aggregated SSH alias config and issues Ed25519 admin keys.

pub mod cli;
pub mod core;
pub mod error;
pub mod resources;
