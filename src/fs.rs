//! File primitives used by the helper and the wider CLI
//!
//! Every call opens, uses and closes its own handle.

use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::substitute_env;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid UTF-8: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
    #[error("Failed to serialize json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

impl FsError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        FsError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True when the underlying cause is a missing file
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::Io { source, .. } if source.kind() == ErrorKind::NotFound)
    }
}

/// Content returned by [`read`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl FileContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(s) => s.as_bytes(),
            FileContent::Bytes(b) => b,
        }
    }

    /// Text view, lossy for raw bytes
    pub fn to_text(&self) -> String {
        match self {
            FileContent::Text(s) => s.clone(),
            FileContent::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }
}

/// Read a file as UTF-8 text, or as raw bytes when `utf8` is false.
///
/// With `force_read`, a decoding failure falls back to raw bytes instead of
/// returning [`FsError::Decode`].
pub fn read(path: &Path, utf8: bool, force_read: bool) -> Result<FileContent, FsError> {
    let bytes = std::fs::read(path).map_err(|e| FsError::io(path, e))?;
    if !utf8 {
        return Ok(FileContent::Bytes(bytes));
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(FileContent::Text(text)),
        Err(e) if force_read => {
            debug!(path = %path.display(), "not valid UTF-8, reading raw bytes");
            Ok(FileContent::Bytes(e.into_bytes()))
        }
        Err(e) => Err(FsError::Decode {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Write content to a file, truncating it
pub fn write(path: &Path, content: impl AsRef<[u8]>) -> Result<(), FsError> {
    std::fs::write(path, content.as_ref()).map_err(|e| FsError::io(path, e))
}

/// Serialize content as JSON and save it
pub fn write_json<T: Serialize + ?Sized>(path: &Path, content: &T) -> Result<(), FsError> {
    let data = serde_json::to_vec(content)?;
    write(path, data)
}

/// Read a JSON file and deserialize it.
///
/// When `env` is given, `${VAR}` placeholders are substituted before parsing.
/// A missing file and invalid JSON both yield an empty object.
pub fn read_json(path: &Path, env: Option<&HashMap<String, String>>) -> Result<Value, FsError> {
    let content = match read(path, true, true) {
        Ok(c) => c,
        Err(e) if e.is_not_found() => return Ok(Value::Object(Default::default())),
        Err(e) => return Err(e),
    };

    let mut data = content.to_text();
    if let Some(env) = env {
        data = substitute_env(&data, env);
    }

    match serde_json::from_str(&data) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Json is invalid, can't load {}", path.display());
            Ok(Value::Object(Default::default()))
        }
    }
}

/// Hex encoded MD5 of a file's raw bytes, or an empty string if there is no such file
pub fn sign(path: &Path) -> Result<String, FsError> {
    if !path.is_file() {
        return Ok(String::new());
    }
    let content = read(path, false, true)?;
    Ok(hex::encode(Md5::digest(content.as_bytes())))
}

/// Remove a directory tree: files first, then directories deepest first,
/// then `path` itself.
///
/// A symlink at `path` is removed itself; its target is left alone.
pub fn deltree(path: &Path) -> Result<(), FsError> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(FsError::io(path, e)),
    };
    if meta.file_type().is_symlink() {
        return std::fs::remove_file(path).map_err(|e| FsError::io(path, e));
    }

    for entry in WalkDir::new(path).contents_first(true) {
        let entry = entry?;
        let p = entry.path();
        if entry.file_type().is_dir() {
            std::fs::remove_dir(p).map_err(|e| FsError::io(p, e))?;
        } else {
            std::fs::remove_file(p).map_err(|e| FsError::io(p, e))?;
        }
    }
    Ok(())
}

/// Create a directory and its parents; an existing directory is fine.
pub fn makedirs(path: &Path) -> Result<(), FsError> {
    std::fs::create_dir_all(path).map_err(|e| FsError::io(path, e))
}

/// Copy a file, keeping permissions and access/modification times
pub fn copy_preserving(src: &Path, dest: &Path) -> Result<(), FsError> {
    std::fs::copy(src, dest).map_err(|e| FsError::io(src, e))?;

    let meta = std::fs::metadata(src).map_err(|e| FsError::io(src, e))?;
    let mut times = std::fs::FileTimes::new();
    if let Ok(t) = meta.modified() {
        times = times.set_modified(t);
    }
    if let Ok(t) = meta.accessed() {
        times = times.set_accessed(t);
    }
    // Read-only copies still accept new times from their owner on unix
    let file = std::fs::OpenOptions::new()
        .read(true)
        .write(cfg!(windows))
        .open(dest)
        .map_err(|e| FsError::io(dest, e))?;
    file.set_times(times).map_err(|e| FsError::io(dest, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_read_text_and_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "héllo").unwrap();

        assert_eq!(read(&path, true, false).unwrap(), FileContent::Text("héllo".into()));
        assert_eq!(
            read(&path, false, false).unwrap(),
            FileContent::Bytes("héllo".as_bytes().to_vec())
        );
    }

    #[test]
    fn test_read_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();

        let err = read(&path, true, false).unwrap_err();
        assert!(matches!(err, FsError::Decode { .. }));

        let forced = read(&path, true, true).unwrap();
        assert_eq!(forced, FileContent::Bytes(vec![0xff, 0xfe, 0x00, 0x41]));
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = read(&dir.path().join("nope"), true, false).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.json");

        for value in [
            json!({"env": {"default": {"db": "http://127.0.0.1:5984/app"}}}),
            json!(["a", 1, null, true]),
            json!("plain"),
            json!(42),
        ] {
            write_json(&path, &value).unwrap();
            assert_eq!(read_json(&path, None).unwrap(), value);
        }
    }

    #[test]
    fn test_read_json_missing_and_invalid() {
        let dir = tempdir().unwrap();
        assert_eq!(read_json(&dir.path().join("missing.json"), None).unwrap(), json!({}));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert_eq!(read_json(&bad, None).unwrap(), json!({}));
    }

    #[test]
    fn test_read_json_with_environment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rc.json");
        std::fs::write(&path, r#"{"env": {"default": {"db": "http://${COUCH_HOST}/db"}}}"#).unwrap();

        let env = HashMap::from([("COUCH_HOST".to_string(), "couch:5984".to_string())]);
        let value = read_json(&path, Some(&env)).unwrap();
        assert_eq!(value["env"]["default"]["db"], "http://couch:5984/db");

        let raw = read_json(&path, None).unwrap();
        assert_eq!(raw["env"]["default"]["db"], "http://${COUCH_HOST}/db");
    }

    #[test]
    fn test_sign() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f");

        assert_eq!(sign(&path).unwrap(), "");

        std::fs::write(&path, "hello").unwrap();
        let first = sign(&path).unwrap();
        assert_eq!(first, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(sign(&path).unwrap(), first);

        std::fs::write(&path, "hello!").unwrap();
        assert_ne!(sign(&path).unwrap(), first);
    }

    #[test]
    fn test_sign_directory_is_empty() {
        let dir = tempdir().unwrap();
        assert_eq!(sign(dir.path()).unwrap(), "");
    }

    #[test]
    fn test_deltree() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("tree");
        std::fs::create_dir_all(root.join("a/b/c")).unwrap();
        std::fs::create_dir_all(root.join("d")).unwrap();
        std::fs::write(root.join("top.txt"), "1").unwrap();
        std::fs::write(root.join("a/b/mid.txt"), "2").unwrap();
        std::fs::write(root.join("a/b/c/deep.txt"), "3").unwrap();

        deltree(&root).unwrap();
        assert!(!root.exists());

        // missing path is a no-op
        deltree(&root).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_deltree_symlink_root_keeps_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir_all(target.join("sub")).unwrap();
        std::fs::write(target.join("sub/keep.txt"), "keep").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        deltree(&link).unwrap();
        assert!(std::fs::symlink_metadata(&link).is_err());
        assert_eq!(std::fs::read_to_string(target.join("sub/keep.txt")).unwrap(), "keep");
    }

    #[test]
    fn test_read_json_propagates_other_io_errors() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, "{}").unwrap();

        // a path through a regular file is NotADirectory, not NotFound
        let err = read_json(&file.join("child.json"), None).unwrap_err();
        assert!(!err.is_not_found());
        assert!(matches!(err, FsError::Io { .. }));

        // reading a directory is an error too
        assert!(read_json(dir.path(), None).is_err());
    }

    #[test]
    fn test_makedirs_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x/y");
        makedirs(&path).unwrap();
        makedirs(&path).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_makedirs_over_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        std::fs::write(&path, "").unwrap();
        assert!(makedirs(&path).is_err());
    }

    #[test]
    fn test_copy_preserving_keeps_mtime() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::write(&src, "data").unwrap();

        let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        let f = std::fs::OpenOptions::new().write(true).open(&src).unwrap();
        f.set_times(std::fs::FileTimes::new().set_modified(old)).unwrap();
        drop(f);

        copy_preserving(&src, &dest).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "data");
        assert_eq!(std::fs::metadata(&dest).unwrap().modified().unwrap(), old);
    }
}
