//! Literal file materialization.
//!
//! Every entry is written relative to its scope's workdir. Parent
//! directories are created as needed and existing files are overwritten
//! unconditionally (no atomic replace, no backup).

use crate::core::hasher;
use crate::core::types::{Action, PlannedChange, Stage};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::path::Path;

/// Plan one `WriteFile` per entry, in declaration order.
pub fn plan_files(
    scope: &str,
    dir: &Path,
    files: &IndexMap<String, String>,
) -> Result<Vec<PlannedChange>> {
    files
        .iter()
        .map(|(name, content)| {
            let path = dir.join(name);
            let status = hasher::content_status(&path, content)?;
            Ok(PlannedChange {
                stage: Stage::Files,
                scope: scope.to_string(),
                description: format!("{}: file {}", scope, path.display()),
                action: Action::WriteFile {
                    path,
                    content: content.clone(),
                },
                status,
            })
        })
        .collect()
}

/// Write `content` to `path`, creating missing parent directories.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::fs("create directory", parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| Error::fs("write", path, e))?;
    log::debug!("wrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executor::apply_change;
    use crate::core::types::PlanAction;

    fn files(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn apply(dir: &Path, f: &IndexMap<String, String>) -> Vec<PlannedChange> {
        let changes = plan_files("alpha", dir, f).unwrap();
        for change in &changes {
            apply_change(change).unwrap();
        }
        changes
    }

    #[test]
    fn test_apply_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let f = files(&[("a.txt", "A"), ("deep/nested/b.txt", "B")]);
        let changes = apply(dir.path(), &f);
        assert_eq!(changes.len(), 2);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "A");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("deep/nested/b.txt")).unwrap(),
            "B"
        );
    }

    #[test]
    fn test_apply_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "old contents, longer").unwrap();
        let changes = apply(dir.path(), &files(&[("a.txt", "new")]));
        assert_eq!(changes[0].status, PlanAction::Update);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "new");
    }

    #[test]
    fn test_apply_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let f = files(&[("x/y.conf", "k=v\n")]);
        apply(dir.path(), &f);
        let first = hasher::hash_file(&dir.path().join("x/y.conf")).unwrap();
        let changes = apply(dir.path(), &f);
        assert_eq!(changes[0].status, PlanAction::NoOp);
        assert_eq!(hasher::hash_file(&dir.path().join("x/y.conf")).unwrap(), first);
    }

    #[test]
    fn test_write_file_into_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not dir").unwrap();
        let err = write_file(&blocker.join("child.txt"), "x").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Filesystem);
    }

    #[test]
    fn test_plan_files_status_and_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("same"), "S").unwrap();
        std::fs::write(dir.path().join("diff"), "old").unwrap();
        let f = files(&[("new", "N"), ("same", "S"), ("diff", "D")]);
        let plan = plan_files("alpha", dir.path(), &f).unwrap();
        let statuses: Vec<_> = plan.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![PlanAction::Create, PlanAction::NoOp, PlanAction::Update]
        );
        assert!(plan.iter().all(|c| c.stage == Stage::Files && c.scope == "alpha"));
        assert_eq!(plan[0].action.path(), dir.path().join("new"));
    }
}
