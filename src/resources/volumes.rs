//! Host-side volume directory reconciliation.
//!
//! For each service volume the host path is token-expanded with the
//! cluster's dot-env block (plus `HOME`), tilde-expanded, and created when
//! missing. Named and anonymous volumes are left to the container runtime.

use crate::core::compose;
use crate::core::env::{self, EnvMap};
use crate::core::types::{Action, ClusterConfig, PlanAction, PlannedChange, Stage};
use crate::core::workdir;
use crate::error::{Error, Result};
use indexmap::IndexSet;
use std::path::{Path, PathBuf};

/// Expanded host directories a cluster's services need, deduplicated, in
/// service-then-volume order.
pub fn host_dirs(cluster: &ClusterConfig, workdir: &Path, home: &str) -> Result<Vec<PathBuf>> {
    let env = env::cluster_env(cluster.dot_env(), home);
    let mut dirs = IndexSet::new();

    for service in compose::services(&cluster.docker_compose)? {
        for source in service.volume_sources()? {
            if !compose::is_host_path(source) {
                log::debug!("service {}: skipping named volume '{}'", service.name, source);
                continue;
            }
            let dir = expand_host_path(source, &env, workdir).map_err(|e| match e {
                Error::Config { message } => {
                    Error::config(format!("service '{}' volume: {}", service.name, message))
                }
                other => other,
            })?;
            log::debug!("service {}: volume {} -> {}", service.name, source, dir.display());
            dirs.insert(dir);
        }
    }

    Ok(dirs.into_iter().collect())
}

/// Expand tokens and `~` in a host path; relative results anchor at the
/// cluster workdir, next to `docker-compose.yml`.
pub fn expand_host_path(source: &str, env: &EnvMap, workdir: &Path) -> Result<PathBuf> {
    let expanded = env::expand_tokens(source, env)?;
    Ok(workdir::absolutize(&expanded, workdir))
}

/// Plan a `CreateDir` per host directory: CREATE if absent, NO-OP otherwise.
pub fn plan_volumes(
    cluster_name: &str,
    cluster: &ClusterConfig,
    workdir: &Path,
    home: &str,
) -> Result<Vec<PlannedChange>> {
    Ok(host_dirs(cluster, workdir, home)?
        .into_iter()
        .map(|path| {
            let status = if path.is_dir() {
                PlanAction::NoOp
            } else {
                PlanAction::Create
            };
            PlannedChange {
                stage: Stage::Volumes,
                scope: cluster_name.to_string(),
                description: format!("{}: volume dir {}", cluster_name, path.display()),
                action: Action::CreateDir { path },
                status,
            }
        })
        .collect())
}
