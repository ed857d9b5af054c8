use std::path::PathBuf;

use crate::adapters::key_stores::file_key_store::FileKeyStore;
use crate::cli::commands::batch_helpers::{self, Settings};
use crate::cli::{BatchArgs, context, output};
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::models::batch::{BatchRequest, Mode};
use crate::core::models::key_material::{KeyKind, KeyMaterial};
use crate::core::models::outcome::BatchStatus;
use crate::core::services::key_validator;
use crate::core::traits::key_store::KeyStore;

/// Execute the `agebatch encrypt` command.
///
/// Each file is encrypted to `<file>.age` (or a free variant of it) for
/// every recipient. Without `--key`, the remembered recipients are used.
pub fn execute(args: &BatchArgs, settings: &Settings) -> Result<BatchStatus> {
    let files = batch_helpers::collect_files(&args.paths);
    execute_files(files, &args.keys, settings)
}

/// Encrypt an already collected list of files.
pub fn execute_files(
    files: Vec<PathBuf>,
    key_paths: &[PathBuf],
    settings: &Settings,
) -> Result<BatchStatus> {
    let config = AppConfig::load(context::config_dir())?;
    let store = FileKeyStore::new(context::recipients_path());

    let keys = if key_paths.is_empty() {
        remembered_recipients(&store)?
    } else {
        let keys = batch_helpers::load_keys(key_paths);
        if config.keys.remember && keys.iter().all(|k| k.is(KeyKind::Public)) {
            remember(&store, &keys)?;
        }
        keys
    };

    let request = BatchRequest::new(Mode::Encrypt, files, keys);
    batch_helpers::run(request, settings, &config)
}

/// Load remembered recipients, dropping entries that are no longer valid
/// public keys. The store is rewritten when anything was dropped.
fn remembered_recipients(store: &impl KeyStore) -> Result<Vec<KeyMaterial>> {
    let paths = store.list()?;
    if paths.is_empty() {
        return Ok(Vec::new());
    }

    let (valid, dropped): (Vec<_>, Vec<_>) = paths
        .into_iter()
        .map(key_validator::load)
        .partition(|k| k.is(KeyKind::Public));

    if !dropped.is_empty() {
        for key in &dropped {
            output::warning(&format!(
                "Forgetting remembered key {}: not a valid public key anymore",
                key.path().display()
            ));
        }
        let keep: Vec<PathBuf> = valid.iter().map(|k| k.path().to_path_buf()).collect();
        store.replace(&keep)?;
    }

    for key in &valid {
        output::detail(&format!("Using remembered recipient {}", key.path().display()));
    }
    Ok(valid)
}

/// Replace the remembered recipients with the keys given on this run.
fn remember(store: &impl KeyStore, keys: &[KeyMaterial]) -> Result<()> {
    let paths: Vec<PathBuf> = keys
        .iter()
        .map(|k| std::fs::canonicalize(k.path()).unwrap_or_else(|_| k.path().to_path_buf()))
        .collect();
    store.replace(&paths)?;
    output::detail(&format!("Remembered {} recipient key(s)", paths.len()));
    Ok(())
}
