use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::models::batch::{Mode, has_engine_extension};

/// Expands the paths a user hands over into the list of files to process.
///
/// Directories are walked recursively in name order. Anything whose name
/// starts with `.` is skipped, including directories and their contents.
/// Paths that do not exist are kept so that validation can report them.
pub struct FileCollector {
    inputs: Vec<PathBuf>,
}

impl FileCollector {
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self { inputs }
    }

    /// Collect every file, keeping argument order.
    pub fn collect(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for input in &self.inputs {
            if is_hidden(input) {
                tracing::debug!(path = %input.display(), "skipping hidden path");
                continue;
            }
            if input.is_dir() {
                files.extend(walk(input));
            } else {
                files.push(input.clone());
            }
        }
        files
    }
}

fn walk(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') && n != "." && n != "..")
}

/// Pick the batch mode from the collected files: decrypt when every file
/// is an `.age` file, encrypt otherwise. Empty or mixed batches come out as
/// encrypt and are then refused by pre-flight validation.
pub fn detect_mode(files: &[PathBuf]) -> Mode {
    if !files.is_empty() && files.iter().all(|p| has_engine_extension(p)) {
        Mode::Decrypt
    } else {
        Mode::Encrypt
    }
}
