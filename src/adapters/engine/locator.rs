use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::errors::{AgeBatchError, Result};

/// File name of the engine binary on this platform.
pub fn engine_file_name() -> &'static str {
    if cfg!(windows) { "age.exe" } else { "age" }
}

/// Finds the engine binary.
///
/// Search order: an explicit override, the bundled helper directory
/// (`<exe dir>/../libexec`), the directory of the running executable, then
/// every directory on `PATH`.
pub struct EngineLocator {
    override_path: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
    path_var: Option<OsString>,
}

impl EngineLocator {
    /// Locator for the current process environment.
    pub fn from_env(override_path: Option<PathBuf>) -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        Self::new(override_path, exe_dir, std::env::var_os("PATH"))
    }

    pub fn new(
        override_path: Option<PathBuf>,
        exe_dir: Option<PathBuf>,
        path_var: Option<OsString>,
    ) -> Self {
        Self {
            override_path,
            exe_dir,
            path_var,
        }
    }

    /// Directories searched for a binary called `name`, in order.
    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(exe_dir) = &self.exe_dir {
            if let Some(prefix) = exe_dir.parent() {
                dirs.push(prefix.join("libexec"));
            }
            dirs.push(exe_dir.clone());
        }
        if let Some(path_var) = &self.path_var {
            dirs.extend(std::env::split_paths(path_var).filter(|d| !d.as_os_str().is_empty()));
        }
        dirs
    }

    /// Every path that will be searched, in order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        match &self.override_path {
            // A bare name such as `rage` is searched like the default one.
            Some(path) if is_bare_name(path) => {
                let mut out = vec![path.clone()];
                out.extend(self.search_dirs().into_iter().map(|d| d.join(path)));
                out
            }
            Some(path) => vec![path.clone()],
            None => self
                .search_dirs()
                .into_iter()
                .map(|d| d.join(engine_file_name()))
                .collect(),
        }
    }

    /// Return the first candidate that is a file.
    pub fn locate(&self) -> Result<PathBuf> {
        let candidates = self.candidates();
        if let Some(found) = candidates.iter().find(|p| p.is_file()) {
            tracing::debug!(engine = %found.display(), "engine located");
            return Ok(found.clone());
        }

        let searched = candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(AgeBatchError::EngineNotFound {
            searched: if searched.is_empty() {
                "(no search locations)".to_string()
            } else {
                searched
            },
        })
    }
}

fn is_bare_name(path: &Path) -> bool {
    path.components().count() == 1 && path.parent().is_some_and(|p| p.as_os_str().is_empty())
}
