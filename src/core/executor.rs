//! Executor: the provisioning pipeline.
//!
//! validate → resolve workdirs → plan selected stages → apply stage by stage.
//! The first failing change aborts the run; earlier effects stay in place.

use super::parser;
use super::planner::{self, PlanContext};
use super::types::*;
use super::workdir::{self, Workdirs};
use crate::error::{Error, Result};
use crate::resources::{files, keys};
use std::path::Path;
use std::time::Instant;

/// Configuration for a provisioning run.
pub struct ProvisionConfig<'a> {
    pub config: &'a ProjectConfig,
    /// Directory relative workdirs are anchored at (the config file's parent)
    pub base_dir: &'a Path,
    /// Stages to run; empty means all
    pub stages: &'a [Stage],
    pub rotate_keys: bool,
}

/// Validate the config and compute the plan without touching the disk.
pub fn build_plan(cfg: &ProvisionConfig) -> Result<ExecutionPlan> {
    parser::check_config(cfg.config)?;
    let workdirs = Workdirs::resolve(cfg.config, cfg.base_dir)?;
    let home = workdir::home_dir()?;
    log::debug!("project workdir: {}", workdirs.project.display());

    let ctx = PlanContext {
        config: cfg.config,
        workdirs: &workdirs,
        home: &home,
        rotate_keys: cfg.rotate_keys,
    };
    planner::plan(&ctx, cfg.stages)
}

/// Run the pipeline.
pub fn provision(cfg: &ProvisionConfig) -> Result<Vec<StageResult>> {
    let plan = build_plan(cfg)?;
    log::info!(
        "plan: {} to create, {} to update, {} unchanged",
        plan.to_create,
        plan.to_update,
        plan.unchanged
    );

    let mut results = Vec::new();
    for stage in Stage::select(cfg.stages) {
        let result = apply_stage(&plan, stage).map_err(|e| e.in_stage(stage))?;
        results.push(result);
    }
    Ok(results)
}

/// Apply every planned change of one stage, in plan order.
pub fn apply_stage(plan: &ExecutionPlan, stage: Stage) -> Result<StageResult> {
    let start = Instant::now();
    let mut result = StageResult {
        stage,
        created: 0,
        updated: 0,
        unchanged: 0,
        total_duration: std::time::Duration::ZERO,
    };

    log::info!("stage {}", stage);
    for change in plan.stage_changes(stage) {
        apply_change(change)?;
        match change.status {
            PlanAction::Create => result.created += 1,
            PlanAction::Update => result.updated += 1,
            PlanAction::NoOp => result.unchanged += 1,
        }
    }

    result.total_duration = start.elapsed();
    Ok(result)
}

/// Perform a single change.
///
/// File writes always happen, even when the content is unchanged; directory
/// creation and key issuance are skipped when already satisfied.
pub fn apply_change(change: &PlannedChange) -> Result<()> {
    match &change.action {
        Action::CreateDir { path } => {
            if change.status == PlanAction::NoOp {
                log::debug!("{} already exists", path.display());
                return Ok(());
            }
            std::fs::create_dir_all(path).map_err(|e| Error::fs("create directory", path, e))?;
            log::info!("created {}", path.display());
        }
        Action::WriteFile { path, content } => {
            files::write_file(path, content)?;
            log::info!("wrote {} [{}]", path.display(), change.status);
        }
        Action::IssueKey {
            private_path,
            public_path,
            comment,
        } => {
            if change.status == PlanAction::NoOp {
                log::debug!("keeping existing keypair {}", private_path.display());
                return Ok(());
            }
            if let Some(parent) = private_path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::fs("create directory", parent, e))?;
            }
            let fingerprint = keys::issue_keypair(private_path, public_path, comment)?;
            log::info!("issued {} ({})", private_path.display(), fingerprint);
        }
        Action::RestrictMode { path, mode } => {
            keys::restrict_mode(path, *mode)?;
            log::info!("set mode {:o} on {}", mode, path.display());
        }
    }
    Ok(())
}
