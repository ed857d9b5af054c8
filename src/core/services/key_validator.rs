use std::path::{Path, PathBuf};

use crate::core::models::key_material::{KeyKind, KeyMaterial};

/// Prefix of an age recipient (public) key.
pub const RECIPIENT_PREFIX: &str = "age1";

/// Prefix of an age identity (private) key.
pub const IDENTITY_PREFIX: &str = "AGE-SECRET-KEY-";

/// Yields the meaningful lines of a key file: trimmed, non-empty, and not
/// starting with `#`.
pub fn content_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Classify key file content by its first meaningful line.
pub fn classify_content(content: &str) -> KeyKind {
    match content_lines(content).next() {
        Some(line) if line.starts_with(RECIPIENT_PREFIX) => KeyKind::Public,
        Some(line) if line.starts_with(IDENTITY_PREFIX) => KeyKind::Private,
        _ => KeyKind::Invalid,
    }
}

/// Classify the key file at `path`.
///
/// Anything that cannot be read as UTF-8 text (missing file, permissions,
/// binary content) is `Invalid`.
pub fn classify(path: &Path) -> KeyKind {
    match std::fs::read_to_string(path) {
        Ok(content) => classify_content(&content),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "key file unreadable");
            KeyKind::Invalid
        }
    }
}

/// Returns `true` if the key file at `path` is of the `required` kind.
pub fn validate(path: &Path, required: KeyKind) -> bool {
    required != KeyKind::Invalid && classify(path) == required
}

/// Load and classify a key file.
pub fn load(path: impl Into<PathBuf>) -> KeyMaterial {
    let path = path.into();
    let kind = classify(&path);
    KeyMaterial::new(path, kind)
}
