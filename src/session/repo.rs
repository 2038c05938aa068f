use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::Conf;
use crate::error::{Error, Result};
use crate::progress::Payload;

/// One repository section of a `.repo` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoConfig {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub baseurl: Vec<String>,
    pub metalink: Option<String>,
    pub mirrorlist: Option<String>,
    pub path: PathBuf,
}

impl RepoConfig {
    fn from_section(conf: &Conf, id: String, keys: BTreeMap<String, String>, path: &Path) -> Self {
        let get = |key: &str| keys.get(key).map(|v| conf.substitute(v));
        Self {
            name: get("name").unwrap_or_else(|| id.clone()),
            enabled: keys.get("enabled").map(|v| parse_bool(v)).unwrap_or(true),
            baseurl: get("baseurl")
                .map(|v| v.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            metalink: get("metalink"),
            mirrorlist: get("mirrorlist"),
            path: path.to_path_buf(),
            id,
        }
    }
}

impl fmt::Display for RepoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Repository metadata is reported by id; its size is never known up front.
impl Payload for RepoConfig {}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "yes" | "true" | "on"
    )
}

/// Parse the repository sections of a `.repo` file.
///
/// Values are expanded with the session substitutions. Indented lines
/// continue the previous value (as `baseurl` lists often do).
pub fn parse_repo_file(conf: &Conf, path: &Path, content: &str) -> Result<Vec<RepoConfig>> {
    let mut repos: Vec<RepoConfig> = Vec::new();
    let mut current: Option<(String, BTreeMap<String, String>)> = None;
    let mut last_key: Option<String> = None;

    for (idx, raw) in content.lines().enumerate() {
        let lineno = idx + 1;
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if raw.starts_with([' ', '\t']) {
            if let (Some((_, keys)), Some(key)) = (current.as_mut(), last_key.as_ref())
                && let Some(value) = keys.get_mut(key)
            {
                value.push(' ');
                value.push_str(trimmed);
                continue;
            }
            return Err(Error::repository(
                path,
                format!("line {}: continuation without a key", lineno),
            ));
        }

        if let Some(section) = trimmed.strip_prefix('[') {
            let id = section
                .strip_suffix(']')
                .ok_or_else(|| Error::repository(path, format!("line {}: unterminated section header", lineno)))?
                .trim();
            if id.is_empty() {
                return Err(Error::repository(path, format!("line {}: empty repository id", lineno)));
            }
            let seen = repos.iter().any(|r| r.id == id)
                || current.as_ref().is_some_and(|(cur, _)| cur == id);
            if seen {
                return Err(Error::repository(
                    path,
                    format!("line {}: duplicate repository id '{}'", lineno, id),
                ));
            }
            if let Some((prev, keys)) = current.take() {
                repos.push(RepoConfig::from_section(conf, prev, keys, path));
            }
            current = Some((id.to_string(), BTreeMap::new()));
            last_key = None;
            continue;
        }

        let (key, value) = trimmed
            .split_once('=')
            .ok_or_else(|| Error::repository(path, format!("line {}: expected key=value", lineno)))?;
        let (_, keys) = current.as_mut().ok_or_else(|| {
            Error::repository(path, format!("line {}: option outside of a repository section", lineno))
        })?;
        let key = key.trim().to_string();
        keys.insert(key.clone(), value.trim().to_string());
        last_key = Some(key);
    }

    if let Some((id, keys)) = current {
        repos.push(RepoConfig::from_section(conf, id, keys, path));
    }

    Ok(repos)
}
