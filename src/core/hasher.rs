//! BLAKE3 content hashing, used to tell CREATE / UPDATE / NO-OP apart.

use super::types::PlanAction;
use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;

const STREAM_BUF_SIZE: usize = 65536;

/// Hash a file's contents. Returns `"blake3:{hex}"`.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).map_err(|e| Error::fs("open", path, e))?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; STREAM_BUF_SIZE];
    loop {
        let n = file.read(&mut buf).map_err(|e| Error::fs("read", path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("blake3:{}", hasher.finalize().to_hex()))
}

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Compare desired content against what is on disk at `path`.
pub fn content_status(path: &Path, desired: &str) -> Result<PlanAction> {
    if !path.is_file() {
        return Ok(PlanAction::Create);
    }
    if hash_file(path)? == hash_string(desired) {
        Ok(PlanAction::NoOp)
    } else {
        Ok(PlanAction::Update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_string_deterministic() {
        let h1 = hash_string("hello");
        let h2 = hash_string("hello");
        assert_eq!(h1, h2);
        assert!(h1.starts_with("blake3:"));
        assert_ne!(h1, hash_string("world"));
    }

    #[test]
    fn test_hash_file_matches_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "payload").unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_string("payload"));
    }

    #[test]
    fn test_hash_file_missing() {
        let err = hash_file(Path::new("/nonexistent/stevedore/x")).unwrap_err();
        assert!(err.to_string().contains("cannot open"));
    }

    #[test]
    fn test_content_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        assert_eq!(content_status(&path, "a").unwrap(), PlanAction::Create);
        std::fs::write(&path, "a").unwrap();
        assert_eq!(content_status(&path, "a").unwrap(), PlanAction::NoOp);
        assert_eq!(content_status(&path, "b").unwrap(), PlanAction::Update);
    }
}
