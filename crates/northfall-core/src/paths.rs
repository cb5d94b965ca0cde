use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const NORTHFALL_DIR: &str = ".northfall";
pub const CONFIG_NAME: &str = "config.yaml";
/// Config location relative to the project root, for messages.
pub const CONFIG_FILE: &str = ".northfall/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn northfall_dir(root: &Path) -> PathBuf {
    root.join(NORTHFALL_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    northfall_dir(root).join(CONFIG_NAME)
}
