//! couchapp - configuration and scaffolding helper for CouchApp deployments

mod cli;
mod config;
mod db;
mod error;
mod fs;
mod paths;
mod templates;
mod ui;

use clap::Parser;
use cli::{Cli, Commands};
use error::{AppError, AppResult};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ui::Ui;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "couchapp=debug" } else { "couchapp=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = Ui::new().and_then(|mut ui| run(&mut ui, cli.command));

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(ui: &mut Ui, command: Commands) -> AppResult<String> {
    match command {
        // ====================================================================
        // Scaffolding Commands
        // ====================================================================
        Commands::Init { app_dir, template } => {
            if ui.find_template_dir(&template).is_none() {
                return Err(AppError::TemplateNotFound { app_dir });
            }
            fs::makedirs(&app_dir)?;
            ui.copy_helper(&app_dir, &template)?;

            let rc = app_dir.join(".couchapprc");
            if !rc.exists() {
                ui.write_json(&rc, &serde_json::json!({}))?;
            }
            Ok(format!("Created app in {}", app_dir.display()))
        }

        Commands::Vendor { app_dir } => {
            ui.copy_helper(&app_dir, templates::VENDOR)?;
            Ok(format!("Vendor copied to {}", app_dir.join(templates::VENDOR).display()))
        }

        // ====================================================================
        // Resolution Commands
        // ====================================================================
        Commands::Db { dbstring, app_dir } => {
            load_app_config(ui, app_dir.as_deref())?;
            ui.get_db(&dbstring)?;
            Ok(serde_json::to_string_pretty(ui.db_urls())?)
        }

        Commands::Name {
            dbstring,
            default,
            app_dir,
        } => {
            load_app_config(ui, app_dir.as_deref())?;
            Ok(ui.get_app_name(&dbstring, &default))
        }

        Commands::Config { key, app_dir } => {
            load_app_config(ui, app_dir.as_deref())?;
            match key {
                Some(key) => match ui.conf.get(&key) {
                    Some(value) => Ok(serde_json::to_string_pretty(value)?),
                    None => Ok(String::new()),
                },
                None => Ok(serde_json::to_string_pretty(&ui.conf.as_value())?),
            }
        }

        // ====================================================================
        // File Commands
        // ====================================================================
        Commands::Sign { paths } => {
            let mut signatures = serde_json::Map::new();
            for path in &paths {
                signatures.insert(path.display().to_string(), ui.sign(path)?.into());
            }
            Ok(serde_json::to_string_pretty(&signatures)?)
        }

        Commands::Clean { path } => {
            ui.deltree(&path)?;
            Ok(String::new())
        }
    }
}

fn load_app_config(ui: &mut Ui, app_dir: Option<&Path>) -> AppResult<()> {
    if let Some(dir) = app_dir {
        ui.updateconfig(dir)?;
    }
    Ok(())
}
