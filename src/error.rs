//! Error kinds and process exit codes.

use crate::core::types::Stage;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for stevedore operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading, planning or applying a provisioning run.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Filesystem operation failed
    #[error("cannot {action} {}: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key generation, encoding or validation failed
    #[error("crypto error: {message}")]
    Crypto { message: String },

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// A failure attributed to one pipeline stage
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse error category, used to pick the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Filesystem,
    Crypto,
}

impl ErrorKind {
    /// sysexits-style process exit code.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Config => 78,
            Self::Filesystem => 74,
            Self::Crypto => 70,
        }
    }
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the attempted action and path.
    pub fn fs(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Attribute this error to `stage`, unless it already is.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Self::Stage { .. } => self,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } | Self::Yaml(_) => ErrorKind::Config,
            Self::Filesystem { .. } => ErrorKind::Filesystem,
            Self::Crypto { .. } => ErrorKind::Crypto,
            Self::Stage { source, .. } => source.kind(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

impl From<ssh_key::Error> for Error {
    fn from(e: ssh_key::Error) -> Self {
        Self::crypto(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_exit_codes_are_distinct() {
        let codes = [
            ErrorKind::Config.exit_code(),
            ErrorKind::Filesystem.exit_code(),
            ErrorKind::Crypto.exit_code(),
        ];
        assert_eq!(codes, [78, 74, 70]);
    }

    #[test]
    fn test_yaml_error_is_config_kind() {
        let err: Error = serde_yaml_ng::from_str::<serde_yaml_ng::Value>("a: [b")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_filesystem_error_message() {
        let err = Error::fs(
            "create directory",
            Path::new("/nope/x"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.kind(), ErrorKind::Filesystem);
        assert!(err.to_string().starts_with("cannot create directory /nope/x:"));
    }

    #[test]
    fn test_stage_error_names_stage() {
        let err = Error::crypto("bad key").in_stage(Stage::Keys);
        assert_eq!(err.to_string(), "stage 'keys' failed: crypto error: bad key");
        assert_eq!(err.kind(), ErrorKind::Crypto);
        assert_eq!(err.exit_code(), 70);
    }

    #[test]
    fn test_in_stage_does_not_nest() {
        let err = Error::config("x")
            .in_stage(Stage::Volumes)
            .in_stage(Stage::Keys);
        assert!(err.to_string().starts_with("stage 'volumes' failed"));
    }
}
