//! Read-only view over an opaque docker-compose document.
//!
//! Only `services`, and per service `hostname`, `ports` and `volumes`, are
//! interpreted. Everything else round-trips untouched through the compose
//! writer.

use crate::error::{Error, Result};
use serde_yaml_ng::Value;

/// A service entry of the compose document.
#[derive(Debug, Clone, Copy)]
pub struct ServiceView<'a> {
    pub name: &'a str,
    body: &'a Value,
}

/// A published port. `host` is `None` for container-only entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host: Option<String>,
    pub container: String,
}

/// List the services of a compose document, in document order.
pub fn services(doc: &Value) -> Result<Vec<ServiceView<'_>>> {
    let services = match doc.get("services") {
        Some(Value::Mapping(m)) => m,
        Some(Value::Null) => return Ok(Vec::new()),
        Some(_) => return Err(Error::config("'services' must be a mapping")),
        None => return Err(Error::config("compose document has no 'services'")),
    };

    let mut out = Vec::with_capacity(services.len());
    for (key, body) in services {
        let name = key
            .as_str()
            .ok_or_else(|| Error::config(format!("service name {:?} is not a string", key)))?;
        if !matches!(body, Value::Mapping(_) | Value::Null) {
            return Err(Error::config(format!("service '{}' must be a mapping", name)));
        }
        out.push(ServiceView { name, body });
    }
    Ok(out)
}

impl<'a> ServiceView<'a> {
    /// Declared `hostname`, if any.
    pub fn hostname(&self) -> Option<&'a str> {
        self.body.get("hostname").and_then(Value::as_str)
    }

    /// Hostname truncated at its first `.`, falling back to the service name.
    pub fn short_hostname(&self) -> &'a str {
        let full = self.hostname().unwrap_or(self.name);
        full.split('.').next().unwrap_or(full)
    }

    /// Parsed `ports` entries.
    pub fn ports(&self) -> Result<Vec<PortMapping>> {
        let Some(entries) = self.list("ports")? else {
            return Ok(Vec::new());
        };
        entries
            .iter()
            .map(|entry| match entry {
                Value::String(s) => parse_port(s),
                Value::Number(n) => Ok(PortMapping {
                    host: None,
                    container: n.to_string(),
                }),
                Value::Mapping(_) => parse_long_port(entry),
                other => Err(Error::config(format!(
                    "service '{}': unsupported port entry {:?}",
                    self.name, other
                ))),
            })
            .map(|r| r.map_err(|e| self.context(e)))
            .collect()
    }

    /// The first port mapping that publishes container port 22.
    pub fn ssh_port(&self) -> Result<Option<PortMapping>> {
        Ok(self.ports()?.into_iter().find(PortMapping::is_ssh))
    }

    /// Host-side sources of bind-mount volumes, unexpanded.
    ///
    /// Anonymous volumes (no host side) are omitted.
    pub fn volume_sources(&self) -> Result<Vec<&'a str>> {
        let Some(entries) = self.list("volumes")? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for entry in entries {
            match entry {
                Value::String(s) => {
                    if let Some(host) = volume_host_part(s).map_err(|e| self.context(e))? {
                        out.push(host);
                    }
                }
                Value::Mapping(_) => {
                    let is_bind = entry.get("type").and_then(Value::as_str) == Some("bind");
                    if let (true, Some(source)) =
                        (is_bind, entry.get("source").and_then(Value::as_str))
                    {
                        out.push(source);
                    }
                }
                other => {
                    return Err(self.context(Error::config(format!(
                        "unsupported volume entry {:?}",
                        other
                    ))))
                }
            }
        }
        Ok(out)
    }

    fn list(&self, field: &str) -> Result<Option<&'a Vec<Value>>> {
        match self.body.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Sequence(seq)) => Ok(Some(seq)),
            Some(_) => Err(Error::config(format!(
                "service '{}': '{}' must be a list",
                self.name, field
            ))),
        }
    }

    fn context(&self, err: Error) -> Error {
        match err {
            Error::Config { message } if !message.starts_with("service '") => {
                Error::config(format!("service '{}': {}", self.name, message))
            }
            other => other,
        }
    }
}

impl PortMapping {
    /// Whether the container side is the SSH port.
    pub fn is_ssh(&self) -> bool {
        self.container == "22"
    }

    /// Host-side port as a number.
    pub fn host_port(&self) -> Result<u16> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| Error::config(format!("port {} is not published", self.container)))?;
        host.parse()
            .map_err(|_| Error::config(format!("invalid host port '{}'", host)))
    }
}

/// Parse `[ip:]host:container[/proto]` or a bare `container[/proto]`.
pub fn parse_port(entry: &str) -> Result<PortMapping> {
    let trimmed = entry.trim();
    let without_proto = trimmed.split('/').next().unwrap_or(trimmed);
    let parts: Vec<&str> = without_proto.rsplitn(3, ':').collect();

    let (host, container) = match parts.as_slice() {
        [container] => (None, *container),
        [container, host] | [container, host, _] => (Some(*host), *container),
        _ => (None, ""),
    };

    if container.is_empty() || host.is_some_and(str::is_empty) {
        return Err(Error::config(format!("malformed port mapping '{}'", entry)));
    }

    Ok(PortMapping {
        host: host.map(str::to_string),
        container: container.to_string(),
    })
}

fn parse_long_port(entry: &Value) -> Result<PortMapping> {
    let scalar = |v: &Value| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    let container = entry
        .get("target")
        .and_then(scalar)
        .ok_or_else(|| Error::config("long-syntax port entry has no 'target'"))?;
    Ok(PortMapping {
        host: entry.get("published").and_then(scalar),
        container,
    })
}

/// Host side of a short-syntax volume (`host:container[:mode]`).
///
/// Returns `None` for anonymous volumes (no `:`).
pub fn volume_host_part(entry: &str) -> Result<Option<&str>> {
    match entry.split_once(':') {
        None => Ok(None),
        Some(("", _)) => Err(Error::config(format!(
            "volume '{}' has an empty host path",
            entry
        ))),
        Some((host, _)) => Ok(Some(host)),
    }
}

/// Whether a volume source names a host path rather than a compose-managed
/// named volume.
pub fn is_host_path(source: &str) -> bool {
    source.starts_with(['/', '.', '~', '$'])
}
