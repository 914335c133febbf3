//! Per-cluster Ed25519 admin keypairs.
//!
//! Issuance is idempotent: a valid existing pair is kept unless rotation is
//! requested. The private key is OpenSSH-encoded without a passphrase and
//! must end with mode `0600`; the public key sits next to it with a `.pub`
//! suffix and the [`ADMIN_KEY_COMMENT`] comment.

use crate::core::types::{Action, ClusterConfig, PlanAction, PlannedChange, Stage};
use crate::error::{Error, Result};
use rand_core::OsRng;
use ssh_key::{Algorithm, HashAlg, LineEnding, PrivateKey, PublicKey};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Comment appended to every public key.
pub const ADMIN_KEY_COMMENT: &str = "admin key host";

/// Permission bits required on private keys.
pub const PRIVATE_KEY_MODE: u32 = 0o600;

/// What is currently on disk for a keypair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// Neither file exists
    Missing,
    /// A matching Ed25519 pair; `mode_ok` tells whether the private key is
    /// already owner-only
    Valid { mode_ok: bool },
}

/// `<key>.pub`, appended the way ssh-keygen names public keys.
pub fn public_key_path(private_path: &Path) -> PathBuf {
    let mut name = private_path.as_os_str().to_os_string();
    name.push(".pub");
    PathBuf::from(name)
}

/// Inspect an existing keypair.
///
/// A half-present pair, a non-Ed25519 key, an encrypted key or a public key
/// that does not belong to the private key is an error: regenerating would
/// silently invalidate distributed keys.
pub fn inspect(private_path: &Path, public_path: &Path) -> Result<KeyState> {
    match (private_path.exists(), public_path.exists()) {
        (false, false) => return Ok(KeyState::Missing),
        (true, true) => {}
        _ => {
            return Err(Error::crypto(format!(
                "incomplete keypair at {} (rerun with --rotate-keys to replace it)",
                private_path.display()
            )))
        }
    }

    let private = read_private_key(private_path)?;
    let public = read_public_key(public_path)?;

    if private.algorithm() != Algorithm::Ed25519 {
        return Err(Error::crypto(format!(
            "{} is a {} key, expected ssh-ed25519",
            private_path.display(),
            private.algorithm()
        )));
    }
    if private.is_encrypted() {
        return Err(Error::crypto(format!(
            "{} is passphrase-protected",
            private_path.display()
        )));
    }
    if !keypair_matches(&private, &public) {
        return Err(Error::crypto(format!(
            "{} does not match {} (rerun with --rotate-keys to replace them)",
            public_path.display(),
            private_path.display()
        )));
    }

    Ok(KeyState::Valid {
        mode_ok: file_mode(private_path)?.is_none_or(|m| m == PRIVATE_KEY_MODE),
    })
}

/// Whether `public` is the public half of `private`, re-derived from the
/// secret scalar rather than trusted from the private key file.
pub fn keypair_matches(private: &PrivateKey, public: &PublicKey) -> bool {
    let Some(keypair) = private.key_data().ed25519() else {
        return false;
    };
    let derived = ssh_key::public::Ed25519PublicKey::from(&keypair.private);
    derived == keypair.public && public.key_data().ed25519() == Some(&derived)
}

/// Plan key issuance for one cluster.
pub fn plan_keys(
    cluster_name: &str,
    cluster: &ClusterConfig,
    workdir: &Path,
    rotate: bool,
) -> Result<Vec<PlannedChange>> {
    let private_path = workdir.join(&cluster.admin_key_name);
    let public_path = public_key_path(&private_path);

    let (status, restrict) = if rotate {
        let status = if private_path.exists() || public_path.exists() {
            PlanAction::Update
        } else {
            PlanAction::Create
        };
        (status, false)
    } else {
        match inspect(&private_path, &public_path)? {
            KeyState::Missing => (PlanAction::Create, false),
            KeyState::Valid { mode_ok } => (PlanAction::NoOp, !mode_ok),
        }
    };

    let mut changes = vec![PlannedChange {
        stage: Stage::Keys,
        scope: cluster_name.to_string(),
        description: format!("{}: ed25519 keypair {}", cluster_name, private_path.display()),
        action: Action::IssueKey {
            private_path: private_path.clone(),
            public_path,
            comment: ADMIN_KEY_COMMENT.to_string(),
        },
        status,
    }];

    if restrict {
        changes.push(PlannedChange {
            stage: Stage::Keys,
            scope: cluster_name.to_string(),
            description: format!(
                "{}: restrict {} to {:o}",
                cluster_name,
                private_path.display(),
                PRIVATE_KEY_MODE
            ),
            action: Action::RestrictMode {
                path: private_path,
                mode: PRIVATE_KEY_MODE,
            },
            status: PlanAction::Update,
        });
    }

    Ok(changes)
}

/// Generate a fresh keypair and write both halves, overwriting old files.
///
/// Returns the SHA256 fingerprint of the new public key.
pub fn issue_keypair(private_path: &Path, public_path: &Path, comment: &str) -> Result<String> {
    let private = PrivateKey::random(&mut OsRng, Algorithm::Ed25519)?;
    let mut public = private.public_key().clone();
    public.set_comment(comment);

    let private_pem = private.to_openssh(LineEnding::LF)?;
    write_private(private_path, private_pem.as_bytes())?;
    restrict_mode(private_path, PRIVATE_KEY_MODE)?;

    let public_line = format!("{}\n", public.to_openssh()?);
    std::fs::write(public_path, public_line).map_err(|e| Error::fs("write", public_path, e))?;

    Ok(public.fingerprint(HashAlg::Sha256).to_string())
}

/// Set permission bits on `path` and verify they stuck.
pub fn restrict_mode(path: &Path, mode: u32) -> Result<()> {
    set_mode(path, mode)?;
    match file_mode(path)? {
        Some(actual) if actual != mode => Err(Error::fs(
            "restrict permissions of",
            path,
            std::io::Error::other(format!("mode is {:o}, expected {:o}", actual, mode)),
        )),
        _ => Ok(()),
    }
}

pub fn read_private_key(path: &Path) -> Result<PrivateKey> {
    let pem = std::fs::read_to_string(path).map_err(|e| Error::fs("read", path, e))?;
    Ok(PrivateKey::from_openssh(pem)?)
}

pub fn read_public_key(path: &Path) -> Result<PublicKey> {
    let line = std::fs::read_to_string(path).map_err(|e| Error::fs("read", path, e))?;
    Ok(PublicKey::from_openssh(line.trim())?)
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(PRIVATE_KEY_MODE)
        .open(path)
        .map_err(|e| Error::fs("create", path, e))?;
    file.write_all(bytes).map_err(|e| Error::fs("write", path, e))
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = std::fs::File::create(path).map_err(|e| Error::fs("create", path, e))?;
    file.write_all(bytes).map_err(|e| Error::fs("write", path, e))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| Error::fs("set permissions of", path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Permission bits of `path`; `None` where the platform has none.
#[cfg(unix)]
pub fn file_mode(path: &Path) -> Result<Option<u32>> {
    use std::os::unix::fs::PermissionsExt;
    let meta = std::fs::metadata(path).map_err(|e| Error::fs("stat", path, e))?;
    Ok(Some(meta.permissions().mode() & 0o777))
}

#[cfg(not(unix))]
pub fn file_mode(_path: &Path) -> Result<Option<u32>> {
    Ok(None)
}
