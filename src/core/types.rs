//! Configuration model and plan types.
//!
//! The YAML schema is deliberately shallow: project and cluster settings are
//! typed, while each cluster's `docker_compose` document is kept as an opaque,
//! order-preserving YAML value and only read selectively.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// File entry whose content doubles as the environment for volume paths.
pub const DOT_ENV_FILE: &str = "docker_compose_dot_env";

/// Name of the orchestration descriptor written into each cluster workdir.
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// Name of the aggregated SSH client configuration in the project workdir.
pub const SSH_CONFIG_FILE: &str = "ssh_config";

// ============================================================================
// Top-level config
// ============================================================================

/// Root configuration: the project and its clusters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project working directory (required; checked by validation)
    #[serde(default)]
    pub workdir: Option<String>,

    /// Literal files materialized relative to the project workdir
    #[serde(default)]
    pub files: IndexMap<String, String>,

    /// Clusters in declaration order
    #[serde(default)]
    pub clusters: IndexMap<String, ClusterConfig>,
}

/// A named cluster provisioned into its own working directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Explicit workdir; defaults to `<project workdir>/<cluster name>`
    #[serde(default)]
    pub workdir: Option<String>,

    /// Literal files materialized relative to the cluster workdir
    #[serde(default)]
    pub files: IndexMap<String, String>,

    /// Opaque docker-compose document
    #[serde(default)]
    pub docker_compose: serde_yaml_ng::Value,

    /// Host every SSH alias connects through
    #[serde(default)]
    pub proxy_host: String,

    /// Login user for SSH aliases
    #[serde(default)]
    pub admin_user: String,

    /// File name of the cluster's admin private key
    #[serde(default)]
    pub admin_key_name: String,
}

impl ClusterConfig {
    /// Content of the dot-env file entry, if declared.
    pub fn dot_env(&self) -> Option<&str> {
        self.files.get(DOT_ENV_FILE).map(String::as_str)
    }
}

// ============================================================================
// Stages
// ============================================================================

/// Provisioning stages, in pipeline order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Workdirs,
    Files,
    Compose,
    Volumes,
    SshConfig,
    Keys,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Workdirs,
        Stage::Files,
        Stage::Compose,
        Stage::Volumes,
        Stage::SshConfig,
        Stage::Keys,
    ];

    /// Normalize a stage selection: canonical order, no duplicates.
    /// An empty selection means every stage.
    pub fn select(requested: &[Stage]) -> Vec<Stage> {
        if requested.is_empty() {
            return Self::ALL.to_vec();
        }
        Self::ALL
            .into_iter()
            .filter(|s| requested.contains(s))
            .collect()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workdirs => write!(f, "workdirs"),
            Self::Files => write!(f, "files"),
            Self::Compose => write!(f, "compose"),
            Self::Volumes => write!(f, "volumes"),
            Self::SshConfig => write!(f, "ssh-config"),
            Self::Keys => write!(f, "keys"),
        }
    }
}

// ============================================================================
// Plan
// ============================================================================

/// A filesystem or key operation the executor knows how to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Create a directory and its parents
    CreateDir { path: PathBuf },
    /// Write literal content, creating parent directories
    WriteFile { path: PathBuf, content: String },
    /// Generate an Ed25519 keypair
    IssueKey {
        private_path: PathBuf,
        public_path: PathBuf,
        comment: String,
    },
    /// Reset permission bits on an existing file
    RestrictMode { path: PathBuf, mode: u32 },
}

impl Action {
    /// The primary path this action touches.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::CreateDir { path }
            | Self::WriteFile { path, .. }
            | Self::RestrictMode { path, .. } => path,
            Self::IssueKey { private_path, .. } => private_path,
        }
    }
}

/// How a planned change relates to what is already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Create,
    Update,
    NoOp,
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "CREATE"),
            Self::Update => write!(f, "UPDATE"),
            Self::NoOp => write!(f, "NO-OP"),
        }
    }
}

/// Scope label for project-level changes.
pub const PROJECT_SCOPE: &str = "project";

/// A single planned change.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedChange {
    /// Stage that owns the change
    pub stage: Stage,

    /// Cluster name, or `project`
    pub scope: String,

    /// What to do
    #[serde(flatten)]
    pub action: Action,

    /// Create / update / no-op relative to current disk state
    pub status: PlanAction,

    /// Human-readable description
    pub description: String,
}

/// Full provisioning plan, ordered by stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionPlan {
    pub changes: Vec<PlannedChange>,
    pub to_create: u32,
    pub to_update: u32,
    pub unchanged: u32,
}

impl ExecutionPlan {
    /// Append changes, updating the summary counts.
    pub fn extend(&mut self, changes: Vec<PlannedChange>) {
        for change in changes {
            match change.status {
                PlanAction::Create => self.to_create += 1,
                PlanAction::Update => self.to_update += 1,
                PlanAction::NoOp => self.unchanged += 1,
            }
            self.changes.push(change);
        }
    }

    /// Changes belonging to one stage, in plan order.
    pub fn stage_changes(&self, stage: Stage) -> impl Iterator<Item = &PlannedChange> {
        self.changes.iter().filter(move |c| c.stage == stage)
    }
}

/// Outcome of applying one stage.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: Stage,
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub total_duration: std::time::Duration,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse() {
        let yaml = r#"
workdir: ~/lab
files:
  README: hello
clusters:
  alpha:
    files:
      docker_compose_dot_env: "DATA=/srv"
    docker_compose:
      services:
        web:
          image: nginx
          ports: ["8080:80"]
    proxy_host: gw.example.com
    admin_user: admin
    admin_key_name: id_admin
"#;
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.workdir.as_deref(), Some("~/lab"));
        assert_eq!(config.files["README"], "hello");
        let alpha = &config.clusters["alpha"];
        assert!(alpha.workdir.is_none());
        assert_eq!(alpha.admin_key_name, "id_admin");
        assert_eq!(alpha.dot_env(), Some("DATA=/srv"));
        assert!(alpha.docker_compose.get("services").is_some());
    }

    #[test]
    fn test_config_missing_workdir_still_parses() {
        let config: ProjectConfig = serde_yaml_ng::from_str("clusters: {}").unwrap();
        assert!(config.workdir.is_none());
        assert!(config.files.is_empty());
    }

    #[test]
    fn test_clusters_preserve_declaration_order() {
        let yaml = r#"
workdir: /w
clusters:
  zeta: {}
  alpha: {}
  mid: {}
"#;
        let config: ProjectConfig = serde_yaml_ng::from_str(yaml).unwrap();
        let names: Vec<_> = config.clusters.keys().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Workdirs.to_string(), "workdirs");
        assert_eq!(Stage::SshConfig.to_string(), "ssh-config");
        assert_eq!(Stage::Keys.to_string(), "keys");
    }

    #[test]
    fn test_stage_select_orders_and_dedups() {
        assert_eq!(Stage::select(&[]), Stage::ALL.to_vec());
        assert_eq!(
            Stage::select(&[Stage::Keys, Stage::Files, Stage::Keys]),
            vec![Stage::Files, Stage::Keys]
        );
    }

    #[test]
    fn test_plan_action_display() {
        assert_eq!(PlanAction::Create.to_string(), "CREATE");
        assert_eq!(PlanAction::NoOp.to_string(), "NO-OP");
    }

    #[test]
    fn test_plan_extend_counts() {
        let mut plan = ExecutionPlan::default();
        let mk = |status| PlannedChange {
            stage: Stage::Workdirs,
            scope: PROJECT_SCOPE.to_string(),
            action: Action::CreateDir {
                path: PathBuf::from("/w"),
            },
            status,
            description: String::new(),
        };
        plan.extend(vec![
            mk(PlanAction::Create),
            mk(PlanAction::NoOp),
            mk(PlanAction::Update),
            mk(PlanAction::NoOp),
        ]);
        assert_eq!(plan.to_create, 1);
        assert_eq!(plan.to_update, 1);
        assert_eq!(plan.unchanged, 2);
        assert_eq!(plan.stage_changes(Stage::Workdirs).count(), 4);
        assert_eq!(plan.stage_changes(Stage::Keys).count(), 0);
    }

    #[test]
    fn test_planned_change_json() {
        let change = PlannedChange {
            stage: Stage::SshConfig,
            scope: PROJECT_SCOPE.to_string(),
            action: Action::CreateDir {
                path: PathBuf::from("/w"),
            },
            status: PlanAction::Create,
            description: "create /w".to_string(),
        };
        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains("\"stage\":\"ssh-config\""));
        assert!(json.contains("\"kind\":\"create_dir\""));
        assert!(json.contains("\"status\":\"create\""));
    }
}
