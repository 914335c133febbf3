//! CLI subcommands: provision, plan, validate, init.

use crate::core::executor::{self, ProvisionConfig};
use crate::core::{parser, types};
use crate::error::{Error, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter stevedore.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Parse and validate a config without touching the filesystem
    Validate {
        /// Path to the config file
        file: PathBuf,
    },

    /// Show what provision would do
    Plan {
        /// Path to the config file
        file: PathBuf,

        /// Restrict to these stages (repeatable)
        #[arg(short, long = "stage", value_enum)]
        stages: Vec<types::Stage>,

        /// Plan regeneration of existing admin keys
        #[arg(long)]
        rotate_keys: bool,

        /// Emit the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Provision workdirs, files, compose descriptors, volumes, SSH config and keys
    Provision {
        /// Path to the config file
        file: PathBuf,

        /// Restrict to these stages (repeatable)
        #[arg(short, long = "stage", value_enum)]
        stages: Vec<types::Stage>,

        /// Regenerate admin keys even when valid ones exist
        #[arg(long)]
        rotate_keys: bool,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Plan {
            file,
            stages,
            rotate_keys,
            json,
        } => cmd_plan(&file, &stages, rotate_keys, json),
        Commands::Provision {
            file,
            stages,
            rotate_keys,
        } => cmd_provision(&file, &stages, rotate_keys),
    }
}

const INIT_TEMPLATE: &str = r#"workdir: ~/stevedore

files: {}

clusters:
  lab:
    files:
      docker_compose_dot_env: |
        DATA=~/stevedore-data
    docker_compose:
      services:
        node1:
          image: debian:12
          hostname: node1.lab
          ports:
            - "2201:22"
          volumes:
            - "${DATA}/node1:/data"
    proxy_host: localhost
    admin_user: root
    admin_key_name: id_lab_admin
"#;

fn cmd_init(path: &Path) -> Result<()> {
    let config_path = path.join("stevedore.yaml");
    if config_path.exists() {
        return Err(Error::fs(
            "initialize",
            &config_path,
            std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        ));
    }
    std::fs::create_dir_all(path).map_err(|e| Error::fs("create directory", path, e))?;
    std::fs::write(&config_path, INIT_TEMPLATE).map_err(|e| Error::fs("write", &config_path, e))?;

    println!("Initialized stevedore project at {}", path.display());
    println!("  Created: {}", config_path.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let config = parser::parse_config_file(file)?;
    let errors = parser::validate_config(&config);

    if errors.is_empty() {
        println!(
            "OK: {} ({} clusters, {} project files)",
            file.display(),
            config.clusters.len(),
            config.files.len()
        );
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(Error::config(format!("{} validation error(s)", errors.len())))
    }
}

fn cmd_plan(file: &Path, stages: &[types::Stage], rotate_keys: bool, json: bool) -> Result<()> {
    let config = parser::parse_config_file(file)?;
    let base_dir = base_dir(file)?;
    let cfg = ProvisionConfig {
        config: &config,
        base_dir: &base_dir,
        stages,
        rotate_keys,
    };
    let plan = executor::build_plan(&cfg)?;

    if json {
        let out = serde_json::to_string_pretty(&plan)
            .map_err(|e| Error::config(format!("cannot encode plan: {}", e)))?;
        println!("{}", out);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

/// Display a plan to stdout, grouped by stage.
fn print_plan(plan: &types::ExecutionPlan) {
    let mut current_stage = None;
    for change in &plan.changes {
        if current_stage != Some(change.stage) {
            current_stage = Some(change.stage);
            println!("{}:", change.stage);
        }
        let symbol = match change.status {
            types::PlanAction::Create => "+",
            types::PlanAction::Update => "~",
            types::PlanAction::NoOp => " ",
        };
        println!("  {} {}", symbol, change.description);
    }

    println!();
    println!(
        "Plan: {} to create, {} to update, {} unchanged.",
        plan.to_create, plan.to_update, plan.unchanged
    );
}

fn cmd_provision(file: &Path, stages: &[types::Stage], rotate_keys: bool) -> Result<()> {
    let config = parser::parse_config_file(file)?;
    let base_dir = base_dir(file)?;
    let cfg = ProvisionConfig {
        config: &config,
        base_dir: &base_dir,
        stages,
        rotate_keys,
    };

    let results = executor::provision(&cfg)?;

    for result in &results {
        println!(
            "{}: {} created, {} updated, {} unchanged ({:.2}s)",
            result.stage,
            result.created,
            result.updated,
            result.unchanged,
            result.total_duration.as_secs_f64()
        );
    }
    println!("done");
    Ok(())
}

/// Absolute directory containing the config file.
fn base_dir(file: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(file).map_err(|e| Error::fs("resolve", file, e))?;
    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/")))
}
