//! Search paths for configuration files and user templates

use std::path::PathBuf;

/// Environment variable overriding the rc search path
pub const CONF_PATH_VAR: &str = "COUCHAPPCONF_PATH";

/// Where the helper looks for config files and user template overrides
pub trait PathProvider {
    /// Global and user-level config files, in merge order
    fn rc_paths(&self) -> Vec<PathBuf>;

    /// Roots searched for `templates/<name>` overrides, in priority order
    fn user_paths(&self) -> Vec<PathBuf>;
}

/// Paths derived from the running system
#[derive(Debug, Clone, Default)]
pub struct SystemPaths;

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl PathProvider for SystemPaths {
    fn rc_paths(&self) -> Vec<PathBuf> {
        if let Some(value) = std::env::var_os(CONF_PATH_VAR) {
            return conf_path_entries(&value);
        }

        let mut paths = Vec::new();
        if cfg!(unix) {
            paths.push(PathBuf::from("/etc/couchapp.conf"));
        }
        if let Some(config) = dirs::config_dir() {
            paths.push(config.join("couchapp/couchapp.conf"));
        }
        paths.push(home_dir().join(".couchapp.conf"));
        paths
    }

    fn user_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![home_dir().join(".couchapp")];
        if let Some(config) = dirs::config_dir() {
            paths.push(config.join("couchapp"));
        }
        paths
    }
}

/// Expand a `COUCHAPPCONF_PATH` value: directories contribute their
/// `couchapp.conf`, anything else is taken as a file path.
pub fn conf_path_entries(value: &std::ffi::OsStr) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| if p.is_dir() { p.join("couchapp.conf") } else { p })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_conf_path_entries() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("custom.json");
        let joined = std::env::join_paths([dir.path().to_path_buf(), file.clone()]).unwrap();

        let entries = conf_path_entries(&joined);
        assert_eq!(entries, vec![dir.path().join("couchapp.conf"), file]);
    }

    #[test]
    fn test_user_paths_start_with_dot_couchapp() {
        let paths = SystemPaths.user_paths();
        assert!(paths[0].ends_with(".couchapp"));
    }
}
