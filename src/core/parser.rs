//! YAML parsing and validation.
//!
//! Validation runs before any mutation and collects every problem at once:
//! - the project `workdir` must be set
//! - file names must stay inside their workdir
//! - each cluster needs an `admin_key_name` and a compose `services` mapping
//! - SSH-exposing clusters need `proxy_host` and `admin_user`
//! - port and volume strings must be well-formed

use super::compose;
use super::types::*;
use crate::error::{Error, Result};
use std::path::{Component, Path};

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse a config file from disk.
pub fn parse_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::fs("read", path, e))?;
    parse_config(&content)
}

/// Parse a config from a string.
pub fn parse_config(yaml: &str) -> Result<ProjectConfig> {
    Ok(serde_yaml_ng::from_str(yaml)?)
}

/// Validate a parsed config. Returns a list of errors (empty = valid).
pub fn validate_config(config: &ProjectConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut push = |message: String| errors.push(ValidationError { message });

    if config.workdir.as_deref().is_none_or(|w| w.trim().is_empty()) {
        push("project 'workdir' is required".to_string());
    }

    for name in config.files.keys() {
        if let Err(msg) = check_file_name(name) {
            push(format!("project file '{}': {}", name, msg));
        }
    }

    for (cluster_name, cluster) in &config.clusters {
        for name in cluster.files.keys() {
            if let Err(msg) = check_file_name(name) {
                push(format!("cluster '{}' file '{}': {}", cluster_name, name, msg));
            }
        }

        if cluster.admin_key_name.trim().is_empty() {
            push(format!("cluster '{}' has no admin_key_name", cluster_name));
        } else if let Err(msg) = check_file_name(&cluster.admin_key_name) {
            push(format!("cluster '{}' admin_key_name: {}", cluster_name, msg));
        }

        let services = match compose::services(&cluster.docker_compose) {
            Ok(s) => s,
            Err(e) => {
                push(format!("cluster '{}' docker_compose: {}", cluster_name, message_of(&e)));
                continue;
            }
        };

        let mut exposes_ssh = false;
        for service in &services {
            match service.ssh_port() {
                Ok(Some(port)) => {
                    exposes_ssh = true;
                    if let Err(e) = port.host_port() {
                        push(format!(
                            "cluster '{}' service '{}': {}",
                            cluster_name,
                            service.name,
                            message_of(&e)
                        ));
                    }
                }
                Ok(None) => {}
                Err(e) => push(format!("cluster '{}': {}", cluster_name, message_of(&e))),
            }
            if let Err(e) = service.volume_sources() {
                push(format!("cluster '{}': {}", cluster_name, message_of(&e)));
            }
        }

        if exposes_ssh {
            if cluster.proxy_host.trim().is_empty() {
                push(format!("cluster '{}' exposes SSH but has no proxy_host", cluster_name));
            }
            if cluster.admin_user.trim().is_empty() {
                push(format!("cluster '{}' exposes SSH but has no admin_user", cluster_name));
            }
        }
    }

    errors
}

/// Validate, folding all problems into a single configuration error.
pub fn check_config(config: &ProjectConfig) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        return Ok(());
    }
    let joined = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    Err(Error::config(format!(
        "{} validation error(s): {}",
        errors.len(),
        joined
    )))
}

/// A file name must be a non-empty relative path without `..`.
fn check_file_name(name: &str) -> std::result::Result<(), &'static str> {
    let path = Path::new(name);
    if name.trim().is_empty() {
        return Err("empty file name");
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err("must not contain '..'"),
            Component::RootDir | Component::Prefix(_) => return Err("must be a relative path"),
        }
    }
    Ok(())
}

fn message_of(err: &Error) -> String {
    match err {
        Error::Config { message } => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
workdir: /tmp/lab
files:
  notes/README.md: hi
clusters:
  alpha:
    files:
      docker_compose_dot_env: |
        DATA=/srv/data
    docker_compose:
      services:
        node1:
          image: debian
          hostname: node1.lab
          ports: ["2222:22"]
          volumes: ["${DATA}/n1:/data"]
    proxy_host: gw
    admin_user: admin
    admin_key_name: id_admin
"#;

    fn messages(config: &ProjectConfig) -> Vec<String> {
        validate_config(config).into_iter().map(|e| e.message).collect()
    }

    #[test]
    fn test_parse_valid() {
        let config = parse_config(VALID).unwrap();
        let errors = messages(&config);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert!(check_config(&config).is_ok());
    }

    #[test]
    fn test_missing_workdir() {
        let config = parse_config("clusters: {}").unwrap();
        let err = check_config(&config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(err.to_string().contains("'workdir' is required"));
    }

    #[test]
    fn test_missing_admin_key_name() {
        let yaml = VALID.replace("admin_key_name: id_admin", "");
        let errors = messages(&parse_config(&yaml).unwrap());
        assert!(errors.iter().any(|e| e.contains("no admin_key_name")));
    }

    #[test]
    fn test_ssh_cluster_needs_proxy_and_user() {
        let yaml = VALID
            .replace("proxy_host: gw", "")
            .replace("admin_user: admin", "");
        let errors = messages(&parse_config(&yaml).unwrap());
        assert!(errors.iter().any(|e| e.contains("no proxy_host")));
        assert!(errors.iter().any(|e| e.contains("no admin_user")));
    }

    #[test]
    fn test_non_ssh_cluster_needs_no_proxy() {
        let yaml = r#"
workdir: /w
clusters:
  web:
    docker_compose:
      services:
        nginx: {image: nginx, ports: ["80:80"]}
    admin_key_name: k
"#;
        assert!(messages(&parse_config(yaml).unwrap()).is_empty());
    }

    #[test]
    fn test_missing_services() {
        let yaml = r#"
workdir: /w
clusters:
  alpha:
    admin_key_name: k
"#;
        let errors = messages(&parse_config(yaml).unwrap());
        assert!(errors.iter().any(|e| e.contains("no 'services'")));
    }

    #[test]
    fn test_malformed_port() {
        let yaml = VALID.replace("\"2222:22\"", "\"2222:\"");
        let errors = messages(&parse_config(&yaml).unwrap());
        assert!(errors.iter().any(|e| e.contains("malformed port mapping")));
    }

    #[test]
    fn test_bad_ssh_host_port() {
        let yaml = VALID.replace("\"2222:22\"", "\"99999:22\"");
        let errors = messages(&parse_config(&yaml).unwrap());
        assert!(errors.iter().any(|e| e.contains("invalid host port")));
    }

    #[test]
    fn test_malformed_volume() {
        let yaml = VALID.replace("\"${DATA}/n1:/data\"", "\":/data\"");
        let errors = messages(&parse_config(&yaml).unwrap());
        assert!(errors.iter().any(|e| e.contains("empty host path")));
    }

    #[test]
    fn test_file_name_escape_rejected() {
        let yaml = VALID.replace("notes/README.md", "../outside");
        let errors = messages(&parse_config(&yaml).unwrap());
        assert!(errors.iter().any(|e| e.contains("'..'")));
        let yaml = VALID.replace("notes/README.md", "/etc/passwd");
        let errors = messages(&parse_config(&yaml).unwrap());
        assert!(errors.iter().any(|e| e.contains("relative path")));
    }

    #[test]
    fn test_collects_all_errors() {
        let yaml = r#"
clusters:
  a: {docker_compose: {services: {}}}
  b: {docker_compose: {services: {}}}
"#;
        let errors = messages(&parse_config(yaml).unwrap());
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stevedore.yaml");
        std::fs::write(&path, VALID).unwrap();
        let config = parse_config_file(&path).unwrap();
        assert_eq!(config.clusters.len(), 1);
    }

    #[test]
    fn test_parse_missing_file() {
        let err = parse_config_file(Path::new("/nonexistent/stevedore.yaml")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Filesystem);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_config("not: [valid: yaml: {{");
        assert!(result.is_err());
    }
}
