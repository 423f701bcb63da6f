//! The deployment helper
//!
//! `Ui` owns the merged configuration for one CLI invocation, together
//! with the collaborators it needs: where to look for files and how to
//! create remote databases.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::Config;
use crate::db::{self, CreateDbError, DatabaseClient, HttpDatabaseClient};
use crate::error::AppResult;
use crate::fs;
use crate::paths::{PathProvider, SystemPaths};
use crate::templates;

pub struct Ui {
    pub conf: Config,
    db_urls: Vec<String>,
    env: HashMap<String, String>,
    paths: Box<dyn PathProvider>,
    client: Box<dyn DatabaseClient>,
}

impl Ui {
    /// Helper backed by the real environment, search paths and HTTP client
    pub fn new() -> AppResult<Self> {
        Self::with(
            Box::new(SystemPaths),
            Box::new(HttpDatabaseClient),
            std::env::vars().collect(),
        )
    }

    /// Build a helper from explicit collaborators; reads the rc files
    pub fn with(
        paths: Box<dyn PathProvider>,
        client: Box<dyn DatabaseClient>,
        env: HashMap<String, String>,
    ) -> AppResult<Self> {
        let mut ui = Ui {
            conf: Config::new(),
            db_urls: Vec::new(),
            env,
            paths,
            client,
        };
        let rc = ui.paths.rc_paths();
        ui.readconfig(rc.as_slice())?;
        Ok(ui)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn readconfig<P: AsRef<Path>>(&mut self, paths: &[P]) -> AppResult<()> {
        self.conf.readconfig(paths, &self.env)
    }

    pub fn updateconfig(&mut self, app_dir: &Path) -> AppResult<()> {
        self.conf.updateconfig(app_dir, &self.env)
    }

    // ========================================================================
    // Databases
    // ========================================================================

    /// Resolve `dbstring` and make sure every target database exists.
    ///
    /// Database creation is best-effort: failures are logged, never returned.
    pub fn get_db(&mut self, dbstring: &str) -> AppResult<Vec<String>> {
        let urls = db::resolve_db(&self.conf, dbstring)?;

        for url in &urls {
            match self.client.create_db(url) {
                Ok(()) => debug!(url = %url, "created database"),
                Err(CreateDbError::AlreadyExists) => debug!(url = %url, "database already exists"),
                Err(e) => warn!(url = %url, error = %e, "could not create database"),
            }
        }

        self.db_urls = urls.clone();
        Ok(urls)
    }

    /// URLs from the last `get_db` call
    pub fn db_urls(&self) -> &[String] {
        &self.db_urls
    }

    pub fn get_app_name(&self, dbstring: &str, default: &str) -> String {
        db::resolve_app_name(&self.conf, dbstring, default)
    }

    // ========================================================================
    // Templates
    // ========================================================================

    pub fn find_template_dir(&self, name: &str) -> Option<PathBuf> {
        templates::find_template_dir(name, &self.paths.user_paths())
    }

    pub fn copy_helper(&self, app_dir: &Path, name: &str) -> AppResult<()> {
        templates::copy_helper(app_dir, name, &self.paths.user_paths())
    }

    // ========================================================================
    // Files
    // ========================================================================

    pub fn write_json<T: Serialize + ?Sized>(&self, path: &Path, content: &T) -> AppResult<()> {
        Ok(fs::write_json(path, content)?)
    }

    pub fn sign(&self, path: &Path) -> AppResult<String> {
        Ok(fs::sign(path)?)
    }

    pub fn deltree(&self, path: &Path) -> AppResult<()> {
        Ok(fs::deltree(path)?)
    }
}
