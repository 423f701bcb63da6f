//! Template lookup and scaffolding
//!
//! Templates live under `templates/<name>` in a user override root
//! (`~/.couchapp`, ...) or in the package's bundled `templates/` directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{AppError, AppResult};
use crate::fs::{copy_preserving, makedirs};

/// Template name that nests under `<app_dir>/vendor`
pub const VENDOR: &str = "vendor";

/// Package-relative template roots, in priority order
fn default_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir.join("../share/couchapp/templates"));
    }
    roots.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"));
    roots
}

/// Candidate directories for a template, user overrides first
pub fn template_candidates(name: &str, user_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if !name.is_empty() {
        for root in user_paths {
            candidates.push(root.join("templates").join(name));
        }
    }
    for root in default_roots() {
        candidates.push(root.join(name));
    }
    candidates
}

/// First candidate that is an existing directory
pub fn find_template_dir(name: &str, user_paths: &[PathBuf]) -> Option<PathBuf> {
    template_candidates(name, user_paths)
        .into_iter()
        .find(|p| p.is_dir())
}

fn create_dir_idempotent(path: &Path) -> AppResult<()> {
    match std::fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if !path.is_dir() {
                return Err(AppError::NotADirectory(path.to_path_buf()));
            }
            debug!(path = %path.display(), "directory already exists");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Mirror `template_dir` under `dest`; the template root maps to `dest`.
pub fn copy_tree(template_dir: &Path, dest: &Path) -> AppResult<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(template_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(template_dir)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e))?;
        let target = dest.join(rel);

        let file_type = entry.file_type();
        // Links to directories become plain directories; walkdir does not descend into them
        if file_type.is_dir() || (file_type.is_symlink() && entry.path().is_dir()) {
            create_dir_idempotent(&target)?;
        } else {
            copy_preserving(entry.path(), &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Copy the named template into `app_dir`.
///
/// The `vendor` template goes to `<app_dir>/vendor`, which is created first.
pub fn copy_helper(app_dir: &Path, name: &str, user_paths: &[PathBuf]) -> AppResult<()> {
    let template_dir = find_template_dir(name, user_paths).ok_or_else(|| {
        AppError::TemplateNotFound {
            app_dir: app_dir.to_path_buf(),
        }
    })?;

    let dest = if name == VENDOR {
        let vendor_dir = app_dir.join(VENDOR);
        makedirs(&vendor_dir)?;
        vendor_dir
    } else {
        app_dir.to_path_buf()
    };

    let copied = copy_tree(&template_dir, &dest)?;
    info!(
        template = %template_dir.display(),
        dest = %dest.display(),
        files = copied,
        "copied template"
    );
    Ok(())
}
