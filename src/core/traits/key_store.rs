use std::path::{Path, PathBuf};

use crate::core::errors::Result;

/// Port for remembering recipient key files between runs.
///
/// Stores paths only; the key content is re-read and re-validated every
/// time a batch is built.
pub trait KeyStore: Send + Sync {
    /// Remember a key path.
    fn add(&self, path: &Path) -> Result<()>;

    /// List remembered key paths in insertion order.
    fn list(&self) -> Result<Vec<PathBuf>>;

    /// Forget a key path.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Replace the whole list.
    fn replace(&self, paths: &[PathBuf]) -> Result<()>;
}
