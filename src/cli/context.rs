use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::app_config::RECIPIENTS_FILE;

static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Fallback when the platform has no config directory.
const FALLBACK_DIR: &str = ".agebatch";

/// Initialize the global config directory path.
///
/// If `custom` is provided, uses that path; otherwise the platform config
/// directory (e.g. `~/.config/agebatch`).
pub fn init(custom: Option<&Path>) {
    let dir = custom.map(Path::to_path_buf).unwrap_or_else(|| {
        dirs::config_dir()
            .map(|d| d.join("agebatch"))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DIR))
    });
    let _ = CONFIG_DIR.set(dir);
}

/// Get the current config directory path.
pub fn config_dir() -> &'static Path {
    CONFIG_DIR
        .get()
        .map(|p| p.as_path())
        .unwrap_or(Path::new(FALLBACK_DIR))
}

/// File holding remembered recipient key paths.
pub fn recipients_path() -> PathBuf {
    config_dir().join(RECIPIENTS_FILE)
}
