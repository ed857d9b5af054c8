use std::path::{Path, PathBuf};

use crate::core::errors::{AgeBatchError, Result};
use crate::core::traits::key_store::KeyStore;

/// File-based store for remembered recipient key paths.
///
/// Format: one key file path per line. Blank lines and lines starting
/// with `#` are ignored.
///
/// Example `recipients.txt`:
/// ```text
/// # Remembered recipient keys
/// /home/alice/keys/team.pub
/// /home/alice/keys/backup.pub
/// ```
#[derive(Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    /// Create a key store backed by the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Return the file path this store reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a single line into a key path, if it holds one.
    fn parse_line(line: &str) -> Option<PathBuf> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        Some(PathBuf::from(trimmed))
    }

    /// Serialize all paths back to the file format. The file is text, so
    /// paths that are not valid UTF-8 are left out.
    fn serialize(paths: &[PathBuf]) -> String {
        let mut out = String::from("# Remembered recipient keys\n");
        for path in paths {
            match path.to_str() {
                Some(text) => {
                    out.push_str(text);
                    out.push('\n');
                }
                None => tracing::warn!(
                    path = %path.display(),
                    "not remembering key with a non-UTF-8 path"
                ),
            }
        }
        out
    }

    fn write(&self, paths: &[PathBuf]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, Self::serialize(paths))?;
        Ok(())
    }
}

impl KeyStore for FileKeyStore {
    fn add(&self, path: &Path) -> Result<()> {
        if path.to_str().is_none() {
            return Err(AgeBatchError::UnsupportedKeyPath {
                path: path.to_path_buf(),
            });
        }
        let mut existing = self.list()?;

        if existing.iter().any(|p| p == path) {
            return Err(AgeBatchError::KeyAlreadyExists {
                path: path.to_path_buf(),
            });
        }

        existing.push(path.to_path_buf());
        self.write(&existing)
    }

    fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        Ok(content.lines().filter_map(Self::parse_line).collect())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        let existing = self.list()?;

        if !existing.iter().any(|p| p == path) {
            return Err(AgeBatchError::KeyNotFound {
                path: path.to_path_buf(),
            });
        }

        let filtered: Vec<_> = existing.into_iter().filter(|p| p != path).collect();
        self.write(&filtered)
    }

    fn replace(&self, paths: &[PathBuf]) -> Result<()> {
        let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            if !unique.contains(path) {
                unique.push(path.clone());
            }
        }
        self.write(&unique)
    }
}
