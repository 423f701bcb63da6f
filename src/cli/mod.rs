//! CLI module for couchapp
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "couchapp")]
#[command(about = "Configuration, database resolution and scaffolding for CouchApps")]
#[command(version)]
pub struct Cli {
    /// Log what the helper does (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    // ========================================================================
    // Scaffolding Commands
    // ========================================================================

    /// Create a new app from a template
    Init {
        /// Directory of the new app
        app_dir: PathBuf,
        /// Template to copy
        #[arg(short, long, default_value = "app")]
        template: String,
    },

    /// Copy the vendor template into <app_dir>/vendor
    Vendor {
        /// App directory
        app_dir: PathBuf,
    },

    // ========================================================================
    // Resolution Commands
    // ========================================================================

    /// Resolve a database alias or URL, creating the databases
    Db {
        /// Alias from the env section, or a database URL
        #[arg(default_value = "")]
        dbstring: String,
        /// App directory whose couchapp.json/.couchapprc are merged
        #[arg(short, long)]
        app_dir: Option<PathBuf>,
    },

    /// Resolve the app name configured for a database alias
    Name {
        /// Alias from the env section, or a database URL
        #[arg(default_value = "")]
        dbstring: String,
        /// Name returned when none is configured
        #[arg(short, long)]
        default: String,
        /// App directory whose couchapp.json/.couchapprc are merged
        #[arg(short, long)]
        app_dir: Option<PathBuf>,
    },

    /// Print the merged configuration
    Config {
        /// Print only this top-level key
        #[arg(short, long)]
        key: Option<String>,
        /// App directory whose couchapp.json/.couchapprc are merged
        #[arg(short, long)]
        app_dir: Option<PathBuf>,
    },

    // ========================================================================
    // File Commands
    // ========================================================================

    /// Print the MD5 signature of files
    Sign {
        /// Files to sign
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove a directory tree
    Clean {
        /// Directory to remove
        path: PathBuf,
    },
}
