//! Writes for `.northfall/config.yaml`.
//!
//! The whole document is staged in a sibling tempfile and renamed into place,
//! so `winter` and `winter serve` never load a half-written config.

use crate::error::Result;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Stage `data` next to `path`, creating the parent directory (`.northfall/`)
/// on first use.
fn stage(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Replace `path` with `data`. Used by `Config::save`.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    stage(path, data)?.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create `path` with `data` unless a file is already there, in which case
/// it is left untouched and `false` is returned. Used by `winter init`.
///
/// The existence check and the rename are one step, so two concurrent
/// `init`s cannot both write.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    match stage(path, data)?.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.error.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn atomic_write_creates_northfall_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".northfall/config.yaml");
        atomic_write(&path, b"version: 1\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "version: 1\n");
        assert_eq!(entries(&dir.path().join(".northfall")), ["config.yaml"]);
    }

    #[test]
    fn atomic_write_replaces_existing_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        atomic_write(&path, b"version: 1\n").unwrap();
        atomic_write(&path, b"version: 2\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "version: 2\n");
    }

    #[test]
    fn write_if_missing_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        assert!(write_if_missing(&path, b"first").unwrap());
        assert!(!write_if_missing(&path, b"second").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
        assert_eq!(entries(dir.path()), ["config.yaml"]);
    }
}
