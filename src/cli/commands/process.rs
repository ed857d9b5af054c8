use crate::adapters::collector::file_collector::detect_mode;
use crate::cli::commands::batch_helpers::{self, Settings};
use crate::cli::commands::{decrypt, encrypt};
use crate::cli::{BatchArgs, output};
use crate::core::errors::Result;
use crate::core::models::batch::Mode;
use crate::core::models::outcome::BatchStatus;

/// Execute the `agebatch process` command.
///
/// `.age` files are decrypted, anything else is encrypted. A mix of both,
/// or nothing at all, is refused by the same pre-flight checks as
/// `encrypt`, so `--json` reports the rejection the same way.
pub fn execute(args: &BatchArgs, settings: &Settings) -> Result<BatchStatus> {
    let files = batch_helpers::collect_files(&args.paths);
    let mode = detect_mode(&files);
    output::detail(&format!("Detected mode: {mode}"));

    match mode {
        Mode::Encrypt => encrypt::execute_files(files, &args.keys, settings),
        Mode::Decrypt => decrypt::execute_files(files, &args.keys, settings),
    }
}
