//! Layered JSON configuration for couchapp
//!
//! Configuration is the shallow merge of every JSON object found along the
//! rc search path, optionally extended with the app-level files
//! `couchapp.json` and `.couchapprc`. Later files win on top-level keys.
//!
//! # Environment Variables
//!
//! - `COUCHAPPCONF_PATH`: Override the rc search path (see `paths.rs`)
//! - Any variable referenced as `${NAME}` or `$NAME` in a config file is
//!   substituted from the environment snapshot taken when the helper starts.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::fs::read_json;

/// App-level config files, in merge order
pub const APP_CONFIG_FILES: [&str; 2] = ["couchapp.json", ".couchapprc"];

/// Database value of an env entry: one URL or several
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DbTarget {
    One(String),
    Many(Vec<String>),
}

impl DbTarget {
    pub fn into_urls(self) -> Vec<String> {
        match self {
            DbTarget::One(url) => vec![url],
            DbTarget::Many(urls) => urls,
        }
    }
}

/// One named deployment target under `env`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvEntry {
    #[serde(default)]
    pub db: Option<DbTarget>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite top-level keys with those of `other`
    pub fn merge(&mut self, other: Map<String, Value>) {
        for (key, value) in other {
            self.values.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    fn env(&self) -> Option<&Map<String, Value>> {
        self.values.get("env").and_then(Value::as_object)
    }

    pub fn has_env(&self, alias: &str) -> bool {
        self.env().is_some_and(|env| env.contains_key(alias))
    }

    /// Typed view of `env[alias]`
    pub fn env_entry(&self, alias: &str) -> AppResult<Option<EnvEntry>> {
        let Some(raw) = self.env().and_then(|env| env.get(alias)) else {
            return Ok(None);
        };
        EnvEntry::deserialize(raw)
            .map(Some)
            .map_err(|_| AppError::InvalidEnvironment(alias.to_string()))
    }

    /// Merge each existing regular file in `paths`, in order.
    ///
    /// Missing paths are skipped; files that fail to parse or are not JSON
    /// objects contribute nothing.
    pub fn readconfig<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        env: &HashMap<String, String>,
    ) -> AppResult<()> {
        for path in paths {
            let path = path.as_ref();
            if !path.is_file() {
                continue;
            }
            match read_json(path, Some(env))? {
                Value::Object(map) => {
                    debug!(path = %path.display(), keys = map.len(), "merged config");
                    self.merge(map);
                }
                _ => warn!(path = %path.display(), "config is not a JSON object, ignoring"),
            }
        }
        Ok(())
    }

    /// Merge `couchapp.json` then `.couchapprc` from an app directory
    pub fn updateconfig(&mut self, app_dir: &Path, env: &HashMap<String, String>) -> AppResult<()> {
        let files: Vec<PathBuf> = APP_CONFIG_FILES.iter().map(|f| app_dir.join(f)).collect();
        self.readconfig(files.as_slice(), env)
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Replace `${NAME}` and `$NAME` with values from `env`.
///
/// `$$` yields a literal `$`. Unknown names are left as written.
pub fn substitute_env(text: &str, env: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end)
                    if end > 0
                        && braced[..end].starts_with(is_ident_start)
                        && braced[..end].chars().all(is_ident_char) =>
                {
                    (&braced[..end], end + 2)
                }
                _ => ("", 0),
            }
        } else if after.starts_with(is_ident_start) {
            let end = after.find(|c| !is_ident_char(c)).unwrap_or(after.len());
            (&after[..end], end)
        } else {
            ("", 0)
        };

        if consumed == 0 {
            out.push('$');
            rest = after;
            continue;
        }

        let placeholder = &rest[pos..pos + 1 + consumed];
        match env.get(name) {
            Some(value) => out.push_str(value),
            None => {
                warn!(variable = name, "environment variable not set, leaving placeholder");
                out.push_str(placeholder);
            }
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}
