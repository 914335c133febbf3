//! Stage handlers.
//!
//! Each handler plans its changes against the current disk state and owns
//! the filesystem or crypto primitive the executor applies:
//! 1. `files`: literal file maps
//! 2. `compose`: per-cluster `docker-compose.yml`
//! 3. `volumes`: host directories behind bind mounts
//! 4. `ssh_config`: aggregated SSH aliases
//! 5. `keys`: Ed25519 admin keypairs

pub mod compose;
pub mod files;
pub mod keys;
pub mod ssh_config;
pub mod volumes;
