//! docker-compose descriptor writer.
//!
//! The cluster's document is serialized as-is; key order is preserved by
//! the YAML value's mapping type.

use crate::core::hasher;
use crate::core::types::{Action, ClusterConfig, PlannedChange, Stage, COMPOSE_FILE};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Serialize a compose document.
pub fn render(doc: &serde_yaml_ng::Value) -> Result<String> {
    Ok(serde_yaml_ng::to_string(doc)?)
}

/// Location of the descriptor inside a cluster workdir.
pub fn compose_path(workdir: &Path) -> PathBuf {
    workdir.join(COMPOSE_FILE)
}

/// Plan the descriptor write for one cluster.
pub fn plan_compose(
    cluster_name: &str,
    cluster: &ClusterConfig,
    workdir: &Path,
) -> Result<PlannedChange> {
    let content = render(&cluster.docker_compose)?;
    let path = compose_path(workdir);
    let status = hasher::content_status(&path, &content)?;
    Ok(PlannedChange {
        stage: Stage::Compose,
        scope: cluster_name.to_string(),
        description: format!("{}: compose {}", cluster_name, path.display()),
        action: Action::WriteFile { path, content },
        status,
    })
}
