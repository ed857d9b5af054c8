use std::path::PathBuf;

/// All domain errors for agebatch.
///
/// Pre-flight validation errors abort a whole batch before the engine runs.
/// Invocation errors only ever end up inside a single file's outcome.
#[derive(Debug, thiserror::Error)]
pub enum AgeBatchError {
    #[error(
        "No files to process\n\n  \
         Hidden files and folders (names starting with '.') are skipped.\n  \
         Pass at least one regular file or a folder containing one."
    )]
    NoFiles,

    #[error("File not found: {path}\n\n  Check that the path is correct and the file exists.")]
    FileNotFound { path: PathBuf },

    #[error(
        "No {kind} keys provided\n\n  \
         Solutions:\n    \
         → Pass a key file with --key <path>\n    \
         → Remember recipient keys: agebatch keys add <path>"
    )]
    NoKeys { kind: &'static str },

    #[error(
        "Invalid {kind} key file(s): {files}\n\n  \
         Public keys start with 'age1', private keys with 'AGE-SECRET-KEY-'.\n  \
         Comment lines (#) and blank lines are ignored."
    )]
    InvalidKey { kind: &'static str, files: String },

    #[error("Cannot mix .age and non-.age files in one batch")]
    MixedFileTypes,

    #[error("No .age files to decrypt\n\n  Only files ending in .age can be decrypted.")]
    NotEncrypted,

    #[error("All files are already encrypted (.age)\n\n  Use 'agebatch decrypt' instead.")]
    AlreadyEncrypted,

    #[error("Encryption requires at least one recipient public key")]
    NoRecipientKeys,

    #[error("No valid recipient public keys provided")]
    NoValidRecipients,

    #[error("Decryption requires at least one identity key")]
    NoIdentityKeys,

    #[error("A batch is already running; wait for it to finish")]
    BatchAlreadyRunning,

    #[error("The batch worker stopped before reporting a result")]
    WorkerStopped,

    #[error(
        "age executable not found\n\n  \
         Searched: {searched}\n\n  \
         Solutions:\n    \
         → Install age: https://age-encryption.org\n    \
         → Point to it explicitly: --engine <path> or AGEBATCH_ENGINE=<path>"
    )]
    EngineNotFound { searched: String },

    #[error("Key '{path}' is not in the remembered recipients")]
    KeyNotFound { path: PathBuf },

    #[error(
        "Key path '{path}' is not valid UTF-8 and cannot be remembered\n\n  \
         Rename the key file, or pass it with --key on every run."
    )]
    UnsupportedKeyPath { path: PathBuf },

    #[error("Key '{path}' is already remembered")]
    KeyAlreadyExists { path: PathBuf },

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AgeBatchError>;
