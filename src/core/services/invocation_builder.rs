use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempPath};

use crate::core::errors::{AgeBatchError, Result};
use crate::core::models::batch::{DECRYPTED_SUFFIX, ENGINE_EXTENSION, Mode, has_engine_extension};
use crate::core::models::key_material::{KeyKind, KeyMaterial};
use crate::core::services::{key_validator, path_resolver};

/// What the engine will be asked to do for one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanKind {
    Encrypt {
        /// Where the engine writes the ciphertext.
        output: PathBuf,
        /// Recipient list content, one recipient per line.
        recipients: String,
    },
    Decrypt {
        /// Where the engine writes the plaintext before it is renamed.
        temp_output: PathBuf,
        /// Intended final path, disambiguated when the file is committed.
        final_output: PathBuf,
        identities: Vec<PathBuf>,
    },
}

/// A fully computed invocation that has not touched the filesystem yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlan {
    pub input: PathBuf,
    pub kind: PlanKind,
}

/// Append `.suffix` to a path without going through a lossy string.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Directory that holds `path`, or `.` for a bare file name.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Final output path for decrypting `input`: the `.age` extension is
/// stripped, or `.decrypted` appended when there is none.
pub fn decrypted_path(input: &Path) -> PathBuf {
    if has_engine_extension(input) {
        input.with_extension("")
    } else {
        with_suffix(input, DECRYPTED_SUFFIX)
    }
}

/// Assemble the recipient list from the public keys, dropping comments and
/// blank lines. Unreadable key files are skipped.
fn recipient_list(keys: &[&KeyMaterial]) -> String {
    let mut list = String::new();
    for key in keys {
        let content = match std::fs::read_to_string(key.path()) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(key = %key.path().display(), error = %e, "skipping unreadable recipient key");
                continue;
            }
        };
        for line in key_validator::content_lines(&content) {
            list.push_str(line);
            list.push('\n');
        }
    }
    list
}

/// Compute the invocation for one file.
///
/// Only reads key files and checks output paths; nothing is created until
/// [`InvocationPlan::prepare`].
pub fn plan(mode: Mode, input: &Path, keys: &[KeyMaterial]) -> Result<InvocationPlan> {
    let kind = match mode {
        Mode::Encrypt => {
            let public: Vec<&KeyMaterial> = keys.iter().filter(|k| k.is(KeyKind::Public)).collect();
            if public.is_empty() {
                return Err(AgeBatchError::NoRecipientKeys);
            }
            let recipients = recipient_list(&public);
            if recipients.is_empty() {
                return Err(AgeBatchError::NoValidRecipients);
            }
            PlanKind::Encrypt {
                output: path_resolver::resolve(&with_suffix(input, ENGINE_EXTENSION)),
                recipients,
            }
        }
        Mode::Decrypt => {
            let identities: Vec<PathBuf> = keys
                .iter()
                .filter(|k| k.is(KeyKind::Private))
                .map(|k| k.path().to_path_buf())
                .collect();
            if identities.is_empty() {
                return Err(AgeBatchError::NoIdentityKeys);
            }
            let final_output = decrypted_path(input);
            let temp_name = format!("temp_decrypted_{}", std::process::id());
            PlanKind::Decrypt {
                temp_output: path_resolver::resolve(&with_suffix(&final_output, &temp_name)),
                final_output,
                identities,
            }
        }
    };

    Ok(InvocationPlan {
        input: input.to_path_buf(),
        kind,
    })
}

impl InvocationPlan {
    /// Engine arguments for this plan, given the recipient list location
    /// (encrypt only).
    pub fn args(&self, recipients_file: Option<&Path>) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        match &self.kind {
            PlanKind::Encrypt { output, .. } => {
                args.push("-a".into());
                args.push("-o".into());
                args.push(output.clone().into_os_string());
                if let Some(list) = recipients_file {
                    args.push("-R".into());
                    args.push(list.as_os_str().to_owned());
                }
            }
            PlanKind::Decrypt {
                temp_output,
                identities,
                ..
            } => {
                args.push("-d".into());
                args.push("-o".into());
                args.push(temp_output.clone().into_os_string());
                for identity in identities {
                    args.push("-i".into());
                    args.push(identity.clone().into_os_string());
                }
            }
        }
        args.push(self.input.clone().into_os_string());
        args
    }

    /// Create the ephemeral artifacts this plan needs and take ownership of
    /// them.
    ///
    /// For encryption the recipient list is written to a hidden temp file
    /// next to the input. The engine's output path is tracked as pending
    /// and is deleted on cleanup unless the file is committed.
    pub fn prepare(self) -> Result<PreparedInvocation> {
        let (recipients, pending, target) = match &self.kind {
            PlanKind::Encrypt { output, recipients } => {
                let mut file = tempfile::Builder::new()
                    .prefix(".recipients-")
                    .suffix(".txt")
                    .tempfile_in(parent_dir(&self.input))?;
                file.write_all(recipients.as_bytes())?;
                file.flush()?;
                (
                    Some(file),
                    TempPath::from_path(output),
                    OutputTarget::Direct(output.clone()),
                )
            }
            PlanKind::Decrypt {
                temp_output,
                final_output,
                ..
            } => (
                None,
                TempPath::from_path(temp_output),
                OutputTarget::Rename(final_output.clone()),
            ),
        };

        let args = self.args(recipients.as_ref().map(|f| f.path()));
        Ok(PreparedInvocation {
            args,
            recipients,
            pending: Some(pending),
            target,
        })
    }
}

#[derive(Debug)]
enum OutputTarget {
    /// The engine writes the final file itself.
    Direct(PathBuf),
    /// The engine writes a temp file that is renamed to a free path
    /// derived from this one.
    Rename(PathBuf),
}

/// Why a successful engine run could not be turned into a final output.
#[derive(Debug)]
pub enum CommitError {
    /// The engine exited 0 but the expected file is not there.
    MissingOutput,
    Io(std::io::Error),
}

/// An invocation whose ephemeral artifacts exist on disk.
///
/// Dropping it removes every artifact it still owns; [`cleanup`] does the
/// same but logs failures.
///
/// [`cleanup`]: PreparedInvocation::cleanup
#[derive(Debug)]
pub struct PreparedInvocation {
    args: Vec<OsString>,
    recipients: Option<NamedTempFile>,
    pending: Option<TempPath>,
    target: OutputTarget,
}

impl PreparedInvocation {
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Location of the recipient list, if one was written.
    pub fn recipients_path(&self) -> Option<&Path> {
        self.recipients.as_ref().map(|f| f.path())
    }

    /// Location the engine writes to.
    pub fn pending_output(&self) -> Option<&Path> {
        self.pending.as_deref()
    }

    /// Keep the engine's output after a successful run and return its final
    /// path.
    ///
    /// Decrypted output is renamed to a non-colliding path; the rename
    /// refuses to overwrite a file that appeared in the meantime.
    pub fn commit(&mut self) -> std::result::Result<PathBuf, CommitError> {
        let Some(pending) = self.pending.take() else {
            return Err(CommitError::MissingOutput);
        };

        match &self.target {
            OutputTarget::Direct(output) => {
                // Engine-owned output: a success exit code is enough.
                let _ = pending.keep();
                Ok(output.clone())
            }
            OutputTarget::Rename(desired) => {
                if !pending.exists() {
                    return Err(CommitError::MissingOutput);
                }
                let final_path = path_resolver::resolve(desired);
                match pending.persist_noclobber(&final_path) {
                    Ok(()) => Ok(final_path),
                    Err(e) => {
                        self.pending = Some(e.path);
                        Err(CommitError::Io(e.error))
                    }
                }
            }
        }
    }

    /// Remove every artifact still owned. Failures are logged, never
    /// returned.
    pub fn cleanup(mut self) {
        if let Some(file) = self.recipients.take() {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                tracing::warn!(path = %path.display(), error = %e, "could not remove recipient list");
            }
        }
        if let Some(pending) = self.pending.take() {
            let path = pending.to_path_buf();
            match pending.close() {
                Ok(()) => tracing::debug!(path = %path.display(), "removed stray engine output"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not remove engine output")
                }
            }
        }
    }
}

/// Convenience wrapper over [`plan`] and [`InvocationPlan::prepare`].
pub fn build(mode: Mode, input: &Path, keys: &[KeyMaterial]) -> Result<PreparedInvocation> {
    plan(mode, input, keys)?.prepare()
}

/// Render arguments for logs.
pub fn render_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns `true` if the argument list ends with `input`.
#[cfg(test)]
fn ends_with_input(args: &[OsString], input: &Path) -> bool {
    args.last().map(OsString::as_os_str) == Some(input.as_os_str())
}
