use northfall_core::paths::NORTHFALL_DIR;
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--root` flag / `NORTHFALL_ROOT` env var (passed in as `explicit`)
/// 2. Nearest ancestor of `cwd` containing `.northfall/`
/// 3. Nearest ancestor of `cwd` containing `.git/`
/// 4. `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_marker(&cwd, NORTHFALL_DIR)
        .or_else(|| find_marker(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn find_marker(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn marker_found_from_nested_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(NORTHFALL_DIR)).unwrap();
        let nested = dir.path().join("programs/escrow/src");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_marker(&nested, NORTHFALL_DIR).as_deref(),
            Some(dir.path())
        );
    }

    #[test]
    fn missing_marker_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(find_marker(dir.path(), "__no_such_marker__").is_none());
    }
}
