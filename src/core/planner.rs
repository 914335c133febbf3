//! Plan generation: desired artifacts per stage, diffed against disk.
//!
//! Planning never mutates anything, so every configuration problem
//! (unresolved volume tokens, bad ports, broken keypairs) surfaces before
//! the first write.

use super::types::*;
use super::workdir::Workdirs;
use crate::error::Result;
use crate::resources::{compose, files, keys, ssh_config, volumes};
use std::path::Path;

/// Inputs shared by every stage planner.
pub struct PlanContext<'a> {
    pub config: &'a ProjectConfig,
    pub workdirs: &'a Workdirs,
    pub home: &'a str,
    pub rotate_keys: bool,
}

/// Plan the selected stages, in canonical order.
pub fn plan(ctx: &PlanContext, stages: &[Stage]) -> Result<ExecutionPlan> {
    let mut plan = ExecutionPlan::default();
    for stage in Stage::select(stages) {
        let changes = plan_stage(stage, ctx).map_err(|e| e.in_stage(stage))?;
        plan.extend(changes);
    }
    Ok(plan)
}

/// Plan a single stage.
pub fn plan_stage(stage: Stage, ctx: &PlanContext) -> Result<Vec<PlannedChange>> {
    let mut changes = Vec::new();
    match stage {
        Stage::Workdirs => {
            changes.push(dir_change(PROJECT_SCOPE, &ctx.workdirs.project));
            for (name, dir) in &ctx.workdirs.clusters {
                changes.push(dir_change(name, dir));
            }
        }
        Stage::Files => {
            changes.extend(files::plan_files(
                PROJECT_SCOPE,
                &ctx.workdirs.project,
                &ctx.config.files,
            )?);
            for (name, cluster) in &ctx.config.clusters {
                let dir = ctx.workdirs.cluster(name)?;
                changes.extend(files::plan_files(name, dir, &cluster.files)?);
            }
        }
        Stage::Compose => {
            for (name, cluster) in &ctx.config.clusters {
                let dir = ctx.workdirs.cluster(name)?;
                changes.push(compose::plan_compose(name, cluster, dir)?);
            }
        }
        Stage::Volumes => {
            for (name, cluster) in &ctx.config.clusters {
                let dir = ctx.workdirs.cluster(name)?;
                changes.extend(volumes::plan_volumes(name, cluster, dir, ctx.home)?);
            }
        }
        Stage::SshConfig => {
            changes.push(ssh_config::plan_ssh_config(ctx.config, ctx.workdirs)?);
        }
        Stage::Keys => {
            for (name, cluster) in &ctx.config.clusters {
                let dir = ctx.workdirs.cluster(name)?;
                changes.extend(keys::plan_keys(name, cluster, dir, ctx.rotate_keys)?);
            }
        }
    }
    Ok(changes)
}

fn dir_change(scope: &str, path: &Path) -> PlannedChange {
    let status = if path.is_dir() {
        PlanAction::NoOp
    } else {
        PlanAction::Create
    };
    PlannedChange {
        stage: Stage::Workdirs,
        scope: scope.to_string(),
        description: format!("{}: workdir {}", scope, path.display()),
        action: Action::CreateDir {
            path: path.to_path_buf(),
        },
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn setup(root: &Path, yaml: &str) -> (ProjectConfig, Workdirs) {
        let yaml = yaml.replace("@ROOT@", &root.display().to_string());
        let config: ProjectConfig = serde_yaml_ng::from_str(&yaml).unwrap();
        let workdirs = Workdirs::resolve(&config, root).unwrap();
        (config, workdirs)
    }

    const CONFIG: &str = r#"
workdir: @ROOT@/lab
files:
  notes.txt: project notes
clusters:
  alpha:
    files:
      docker_compose_dot_env: "DATA=@ROOT@/data"
      etc/app.conf: "port=1"
    docker_compose:
      services:
        n1:
          hostname: n1.lab
          ports: ["2201:22"]
          volumes: ["${DATA}/n1:/data"]
    proxy_host: gw
    admin_user: admin
    admin_key_name: id_admin
"#;

    #[test]
    fn test_plan_all_stages_in_order() {
        let root = tempfile::tempdir().unwrap();
        let (config, workdirs) = setup(root.path(), CONFIG);
        let ctx = PlanContext {
            config: &config,
            workdirs: &workdirs,
            home: "/home/none",
            rotate_keys: false,
        };
        let plan = plan(&ctx, &[]).unwrap();
        let stages: Vec<_> = plan.changes.iter().map(|c| c.stage).collect();
        let mut sorted = stages.clone();
        sorted.sort();
        assert_eq!(stages, sorted);
        // 2 workdirs + 3 files + 1 compose + 1 volume + 1 ssh config + 1 key
        assert_eq!(plan.changes.len(), 9);
        assert_eq!(plan.to_create, 9);
        assert!(!root.path().join("lab").exists(), "planning must not mutate");
    }

    #[test]
    fn test_plan_selected_stage_only() {
        let root = tempfile::tempdir().unwrap();
        let (config, workdirs) = setup(root.path(), CONFIG);
        let ctx = PlanContext {
            config: &config,
            workdirs: &workdirs,
            home: "/home/none",
            rotate_keys: false,
        };
        let plan = plan(&ctx, &[Stage::Volumes]).unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(
            plan.changes[0].action.path(),
            root.path().join("data").join("n1")
        );
    }

    #[test]
    fn test_workdirs_noop_when_present() {
        let root = tempfile::tempdir().unwrap();
        let (config, workdirs) = setup(root.path(), CONFIG);
        std::fs::create_dir_all(root.path().join("lab/alpha")).unwrap();
        let ctx = PlanContext {
            config: &config,
            workdirs: &workdirs,
            home: "/home/none",
            rotate_keys: false,
        };
        let changes = plan_stage(Stage::Workdirs, &ctx).unwrap();
        assert!(changes.iter().all(|c| c.status == PlanAction::NoOp));
    }

    #[test]
    fn test_plan_error_names_stage() {
        let root = tempfile::tempdir().unwrap();
        let (config, workdirs) = setup(root.path(), &CONFIG.replace("${DATA}", "${NOPE}"));
        let ctx = PlanContext {
            config: &config,
            workdirs: &workdirs,
            home: "/home/none",
            rotate_keys: false,
        };
        let err = plan(&ctx, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().starts_with("stage 'volumes' failed"));
    }
}
