//! MySQL option file (`my.cnf`) reader.
//!
//! Only the subset the daemon needs: `[group]` headers, `key = value` and bare
//! `key` lines, `#`/`;` comments, single or double quoted values. Dashes and
//! underscores in option names are equivalent, as in the MySQL client.
//! `!include` and `!includedir` directives are skipped.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;

/// Option group read by MySQL client programs.
pub const CLIENT_GROUP: &str = "client";

/// Parsed option file: group name -> option name -> value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionFile {
    groups: HashMap<String, HashMap<String, String>>,
}

impl OptionFile {
    /// Read and parse an option file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::OptionFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::parse(&content).map_err(|reason| ConfigError::OptionFile {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse option file content.
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut groups: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('!') {
                debug!("Skipping option file directive: {}", line);
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let name = rest
                    .strip_suffix(']')
                    .ok_or_else(|| format!("line {}: unterminated group header", index + 1))?;
                let name = name.trim().to_lowercase();
                groups.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let group = current
                .as_ref()
                .ok_or_else(|| format!("line {}: option outside of a group", index + 1))?;

            let (key, value) = match line.split_once('=') {
                Some((key, value)) => (key.trim(), unquote(strip_comment(value.trim()))),
                None => (line, String::new()),
            };

            if key.is_empty() {
                return Err(format!("line {}: missing option name", index + 1));
            }

            groups
                .entry(group.clone())
                .or_default()
                .insert(normalize_key(key), value);
        }

        Ok(Self { groups })
    }

    /// Look up an option in a group.
    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        self.groups
            .get(&group.to_lowercase())
            .and_then(|options| options.get(&normalize_key(key)))
            .map(String::as_str)
    }

    /// Look up an option in the `[client]` group.
    pub fn client(&self, key: &str) -> Option<&str> {
        self.get(CLIENT_GROUP, key)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('-', "_")
}

/// Drop a trailing `# comment` from an unquoted value.
fn strip_comment(value: &str) -> &str {
    if value.starts_with('"') || value.starts_with('\'') {
        return value;
    }
    match value.find('#') {
        Some(pos) => value[..pos].trim_end(),
        None => value,
    }
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    value.to_string()
}

#[cfg(test)]
#[path = "option_file_tests.rs"]
mod tests;
