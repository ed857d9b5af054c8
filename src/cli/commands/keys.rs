use std::path::Path;

use crate::adapters::key_stores::file_key_store::FileKeyStore;
use crate::cli::{KeysAction, context, output};
use crate::core::errors::{AgeBatchError, Result};
use crate::core::models::key_material::KeyKind;
use crate::core::models::outcome::display_name;
use crate::core::services::key_validator;
use crate::core::traits::key_store::KeyStore;

/// Execute the `agebatch keys` command.
pub fn execute(action: &KeysAction) -> Result<()> {
    let store = FileKeyStore::new(context::recipients_path());
    match action {
        KeysAction::List => execute_list(&store),
        KeysAction::Add { path } => execute_add(&store, path),
        KeysAction::Remove { path } => execute_remove(&store, path),
        KeysAction::Clear => execute_clear(&store),
    }
}

fn execute_list(store: &FileKeyStore) -> Result<()> {
    let keys = store.list()?;

    if keys.is_empty() {
        output::warning("No remembered recipient keys");
        println!("\n  Add one with: agebatch keys add <path>");
        return Ok(());
    }

    output::header(&format!("Remembered recipients ({})", keys.len()));
    for path in &keys {
        match key_validator::classify(path) {
            KeyKind::Public => output::success(&path.display().to_string()),
            other => output::warning(&format!(
                "{} ({}, will be skipped)",
                path.display(),
                other.label()
            )),
        }
    }
    Ok(())
}

fn execute_add(store: &FileKeyStore, path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(AgeBatchError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if !key_validator::validate(path, KeyKind::Public) {
        return Err(AgeBatchError::InvalidKey {
            kind: KeyKind::Public.label(),
            files: display_name(path),
        });
    }

    let absolute = std::fs::canonicalize(path)?;
    store.add(&absolute)?;
    output::success(&format!("Remembered {}", absolute.display()));
    Ok(())
}

fn execute_remove(store: &FileKeyStore, path: &Path) -> Result<()> {
    // Entries are stored absolute, but the file may be gone by now.
    let target = match std::fs::canonicalize(path) {
        Ok(abs) if store.list()?.contains(&abs) => abs,
        _ => path.to_path_buf(),
    };
    store.remove(&target)?;
    output::success(&format!("Forgot {}", target.display()));
    Ok(())
}

fn execute_clear(store: &FileKeyStore) -> Result<()> {
    let count = store.list()?.len();
    store.replace(&[])?;
    output::success(&format!("Forgot {count} recipient key(s)"));
    Ok(())
}
