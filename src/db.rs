//! Database target resolution
//!
//! A database string is either an alias into the `env` section of the
//! config or, when it contains a `/`, a literal database URL.

use thiserror::Error;

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub const DEFAULT_SERVER_URI: &str = "http://127.0.0.1:5984/";
const USER_AGENT: &str = concat!("couchapp/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum CreateDbError {
    #[error("database already exists")]
    AlreadyExists,
    #[error("server answered HTTP {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(String),
}

/// Remote side of database creation
pub trait DatabaseClient {
    /// Ensure a database exists at `url`
    fn create_db(&self, url: &str) -> Result<(), CreateDbError>;
}

/// Creates databases with a plain `PUT` against CouchDB
#[derive(Debug, Clone, Default)]
pub struct HttpDatabaseClient;

impl DatabaseClient for HttpDatabaseClient {
    fn create_db(&self, url: &str) -> Result<(), CreateDbError> {
        match ureq::put(url).set("User-Agent", USER_AGENT).call() {
            Ok(_) => Ok(()),
            // CouchDB answers 412 file_exists for an existing database
            Err(ureq::Error::Status(412, _)) => Err(CreateDbError::AlreadyExists),
            Err(ureq::Error::Status(code, _)) => Err(CreateDbError::Status(code)),
            Err(e) => Err(CreateDbError::Transport(e.to_string())),
        }
    }
}

fn is_alias(dbstring: &str) -> bool {
    !dbstring.contains('/')
}

/// Resolve a database string into one or more database URLs
pub fn resolve_db(conf: &Config, dbstring: &str) -> AppResult<Vec<String>> {
    if !is_alias(dbstring) {
        return Ok(vec![dbstring.to_string()]);
    }

    let alias = if dbstring.is_empty() { "default" } else { dbstring };
    let configured = conf
        .env_entry(alias)?
        .and_then(|entry| entry.db)
        .map(|db| db.into_urls())
        .filter(|urls| !urls.is_empty());

    match configured {
        Some(urls) => Ok(urls),
        None if dbstring.is_empty() => Err(AppError::DatabaseNotSpecified),
        None => Ok(vec![format!("{}{}", DEFAULT_SERVER_URI, dbstring)]),
    }
}

/// Display name for the app deployed under `dbstring`
pub fn resolve_app_name(conf: &Config, dbstring: &str, default: &str) -> String {
    if !is_alias(dbstring) {
        return default.to_string();
    }

    let alias = if !dbstring.is_empty() && conf.has_env(dbstring) {
        dbstring
    } else if conf.has_env("default") {
        "default"
    } else {
        return default.to_string();
    };

    conf.env_entry(alias)
        .ok()
        .flatten()
        .and_then(|entry| entry.name)
        .unwrap_or_else(|| default.to_string())
}
