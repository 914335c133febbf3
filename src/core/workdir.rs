//! Project and cluster working directory resolution.
//!
//! A cluster's workdir is its explicit `workdir` when set, otherwise
//! `<project workdir>/<cluster name>`. Paths are tilde-expanded and made
//! absolute against the directory holding the config file.

use super::types::ProjectConfig;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Resolved working directories for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workdirs {
    pub project: PathBuf,
    pub clusters: IndexMap<String, PathBuf>,
}

impl Workdirs {
    /// Resolve every workdir of `config`.
    pub fn resolve(config: &ProjectConfig, base_dir: &Path) -> Result<Self> {
        let project = project_workdir(config, base_dir)?;
        let mut clusters = IndexMap::with_capacity(config.clusters.len());
        for name in config.clusters.keys() {
            let dir = cluster_workdir(config, name, base_dir)?;
            log::debug!("cluster {} workdir: {}", name, dir.display());
            clusters.insert(name.clone(), dir);
        }
        Ok(Self { project, clusters })
    }

    /// Workdir of a cluster resolved by [`Workdirs::resolve`].
    pub fn cluster(&self, name: &str) -> Result<&Path> {
        self.clusters
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::config(format!("unknown cluster '{}'", name)))
    }
}

/// The project workdir. Its absence is a configuration error.
pub fn project_workdir(config: &ProjectConfig, base_dir: &Path) -> Result<PathBuf> {
    match config.workdir.as_deref().map(str::trim) {
        Some(w) if !w.is_empty() => Ok(absolutize(w, base_dir)),
        _ => Err(Error::config("project 'workdir' is required")),
    }
}

/// The effective workdir of cluster `name`.
pub fn cluster_workdir(config: &ProjectConfig, name: &str, base_dir: &Path) -> Result<PathBuf> {
    let project = project_workdir(config, base_dir)?;
    let cluster = config
        .clusters
        .get(name)
        .ok_or_else(|| Error::config(format!("unknown cluster '{}'", name)))?;
    match cluster.workdir.as_deref().map(str::trim) {
        Some(w) if !w.is_empty() => Ok(absolutize(w, base_dir)),
        _ => Ok(project.join(name)),
    }
}

/// Tilde-expand `path` and anchor it at `base_dir` when relative.
pub fn absolutize(path: &str, base_dir: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}

/// The invoking user's home directory as a string.
pub fn home_dir() -> Result<String> {
    dirs::home_dir()
        .map(|h| h.to_string_lossy().into_owned())
        .ok_or_else(|| Error::config("cannot determine home directory"))
}
