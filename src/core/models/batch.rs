use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::models::key_material::{KeyKind, KeyMaterial};
use crate::core::models::outcome::BatchResult;

/// File extension written by the engine for encrypted output.
pub const ENGINE_EXTENSION: &str = "age";

/// Suffix appended to a decrypted file whose input had no engine extension.
pub const DECRYPTED_SUFFIX: &str = "decrypted";

/// Returns `true` if the path ends in `.age` (case-insensitive).
pub fn has_engine_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ENGINE_EXTENSION))
}

/// Operation applied to every file of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Encrypt,
    Decrypt,
}

impl Mode {
    /// The key kind every key in a batch of this mode must have.
    pub fn required_key_kind(self) -> KeyKind {
        match self {
            Mode::Encrypt => KeyKind::Public,
            Mode::Decrypt => KeyKind::Private,
        }
    }

    /// Human-readable name ("Encryption", "Decryption").
    pub fn display_name(self) -> &'static str {
        match self {
            Mode::Encrypt => "Encryption",
            Mode::Decrypt => "Decryption",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Encrypt => f.write_str("encrypt"),
            Mode::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// Everything the orchestrator needs to run one batch.
///
/// Inputs keep the caller's order (duplicates included) so that progress
/// reporting follows it. Invariants are checked by the runner's pre-flight
/// validation, not here.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub mode: Mode,
    pub inputs: Vec<PathBuf>,
    pub keys: Vec<KeyMaterial>,
}

impl BatchRequest {
    pub fn new(mode: Mode, inputs: Vec<PathBuf>, keys: Vec<KeyMaterial>) -> Self {
        Self { mode, inputs, keys }
    }
}

/// Notifications emitted by a running batch, in processing order.
///
/// `Finished` is always the last event of a batch.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// A file is about to be processed.
    Starting { index: usize, file_name: String },
    /// A file's turn has ended; `fraction` is `(index + 1) / total`.
    Progress { fraction: f64 },
    Finished(BatchResult),
}
