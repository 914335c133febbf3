//! Core provisioning logic: config model, parsing, resolution, planning, execution.

pub mod compose;
pub mod env;
pub mod executor;
pub mod hasher;
pub mod parser;
pub mod planner;
pub mod types;
pub mod workdir;
