//! Dot-env parsing and `${NAME}` token expansion for volume host paths.

use crate::error::{Error, Result};
use indexmap::IndexMap;

/// Environment available to volume paths of one cluster.
pub type EnvMap = IndexMap<String, String>;

/// Parse newline-separated `KEY=VALUE` pairs.
///
/// Only lines containing `=` count; the split is at the first `=` and both
/// sides are trimmed. Blank lines and `#` comments are ignored.
pub fn parse_dot_env(content: &str) -> EnvMap {
    let mut env = EnvMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            env.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    env
}

/// Build a cluster's environment: its dot-env block plus `HOME`.
pub fn cluster_env(dot_env: Option<&str>, home: &str) -> EnvMap {
    let mut env = dot_env.map(parse_dot_env).unwrap_or_default();
    env.insert("HOME".to_string(), home.to_string());
    env
}

/// Replace every `${NAME}` in `input` with its value from `env`.
///
/// Unknown names, empty names and unterminated tokens are errors. A `$` not
/// followed by `{` is kept as-is. Substituted values are not re-scanned.
pub fn expand_tokens(input: &str, env: &EnvMap) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("${") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after.find('}').ok_or_else(|| {
            Error::config(format!("unterminated token '{}' in '{}'", &rest[open..], input))
        })?;
        let name = &after[..close];
        if name.is_empty() {
            return Err(Error::config(format!("empty token '${{}}' in '{}'", input)));
        }
        let value = env.get(name).ok_or_else(|| {
            Error::config(format!("unresolved token '${{{}}}' in '{}'", name, input))
        })?;
        out.push_str(value);
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
