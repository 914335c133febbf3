//! Aggregated SSH client configuration.
//!
//! Every service publishing container port 22 gets four aliases that all
//! reach the same endpoint through the cluster's proxy host:
//!
//! ```text
//! <short-hostname>   node<NN>   node<N>   <cluster>-<short-hostname>
//! ```
//!
//! `NN`/`N` is one counter shared by all clusters, advanced once per
//! SSH-exposing service in cluster-then-service order.

use crate::core::compose;
use crate::core::types::{
    Action, ClusterConfig, PlannedChange, ProjectConfig, Stage, PROJECT_SCOPE, SSH_CONFIG_FILE,
};
use crate::core::workdir::Workdirs;
use crate::core::hasher;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Leading wildcard block: no host-key prompts, no known_hosts pollution.
pub const HEADER: &str = "Host *\n    StrictHostKeyChecking no\n    UserKnownHostsFile /dev/null\n";

/// One `Host` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAlias {
    pub alias: String,
    pub hostname: String,
    pub user: String,
    pub port: u16,
    pub identity_file: PathBuf,
}

impl HostAlias {
    pub fn render(&self) -> String {
        format!(
            "Host {}\n    Hostname {}\n    User {}\n    Port {}\n    IdentityFile {}\n",
            self.alias,
            quoted(&self.hostname),
            quoted(&self.user),
            self.port,
            quoted(&self.identity_file.display().to_string())
        )
    }
}

/// Double-quote a value containing whitespace; ssh_config splits on it.
fn quoted(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}

/// Aliases for one cluster, starting at `next_index`.
///
/// Returns the aliases and the index the next cluster starts from.
pub fn cluster_aliases(
    cluster_name: &str,
    cluster: &ClusterConfig,
    workdir: &Path,
    next_index: usize,
) -> Result<(Vec<HostAlias>, usize)> {
    let identity_file = workdir.join(&cluster.admin_key_name);
    let mut index = next_index;
    let mut aliases = Vec::new();

    for service in compose::services(&cluster.docker_compose)? {
        let Some(port) = service.ssh_port()? else {
            continue;
        };
        let port = port.host_port()?;
        let short = service.short_hostname();

        let names = [
            short.to_string(),
            format!("node{:02}", index),
            format!("node{}", index),
            format!("{}-{}", cluster_name, short),
        ];
        for alias in names {
            aliases.push(HostAlias {
                alias,
                hostname: cluster.proxy_host.clone(),
                user: cluster.admin_user.clone(),
                port,
                identity_file: identity_file.clone(),
            });
        }
        index += 1;
    }

    Ok((aliases, index))
}

/// Render the full `ssh_config` for every cluster, in config order.
pub fn render(config: &ProjectConfig, workdirs: &Workdirs) -> Result<String> {
    let mut out = String::from(HEADER);
    let mut next_index = 0;

    for (name, cluster) in &config.clusters {
        let (aliases, next) = cluster_aliases(name, cluster, workdirs.cluster(name)?, next_index)?;
        next_index = next;
        for alias in aliases {
            out.push('\n');
            out.push_str(&alias.render());
        }
    }

    Ok(out)
}

/// Location of the aggregated config.
pub fn ssh_config_path(project_workdir: &Path) -> PathBuf {
    project_workdir.join(SSH_CONFIG_FILE)
}

/// Plan the `ssh_config` write.
pub fn plan_ssh_config(config: &ProjectConfig, workdirs: &Workdirs) -> Result<PlannedChange> {
    let content = render(config, workdirs)?;
    let path = ssh_config_path(&workdirs.project);
    let status = hasher::content_status(&path, &content)?;
    Ok(PlannedChange {
        stage: Stage::SshConfig,
        scope: PROJECT_SCOPE.to_string(),
        description: format!("project: ssh config {}", path.display()),
        action: Action::WriteFile { path, content },
        status,
    })
}
