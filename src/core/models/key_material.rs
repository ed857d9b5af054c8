use std::path::{Path, PathBuf};

use serde::Serialize;

/// Classification of a key file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// A recipient (`age1...`) key, used to encrypt.
    Public,
    /// An identity (`AGE-SECRET-KEY-...`) key, used to decrypt.
    Private,
    Invalid,
}

impl KeyKind {
    /// Lowercase name used in messages ("public", "private").
    pub fn label(self) -> &'static str {
        match self {
            KeyKind::Public => "public",
            KeyKind::Private => "private",
            KeyKind::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A key file on disk together with the kind it was classified as
/// when it was loaded.
///
/// The backing file can change between runs, so a `KeyMaterial` is built
/// fresh on every load and never cached across batches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyMaterial {
    path: PathBuf,
    kind: KeyKind,
}

impl KeyMaterial {
    pub fn new(path: PathBuf, kind: KeyKind) -> Self {
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn is(&self, kind: KeyKind) -> bool {
        self.kind == kind
    }
}

impl std::fmt::Display for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.kind)
    }
}
