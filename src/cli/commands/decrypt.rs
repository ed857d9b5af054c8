use std::path::PathBuf;

use crate::cli::commands::batch_helpers::{self, Settings};
use crate::cli::{BatchArgs, context};
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::models::batch::{BatchRequest, Mode};
use crate::core::models::outcome::BatchStatus;

/// Execute the `agebatch decrypt` command.
///
/// Identity keys are only ever taken from `--key`; they are never remembered.
pub fn execute(args: &BatchArgs, settings: &Settings) -> Result<BatchStatus> {
    let files = batch_helpers::collect_files(&args.paths);
    execute_files(files, &args.keys, settings)
}

/// Decrypt an already collected list of `.age` files.
pub fn execute_files(
    files: Vec<PathBuf>,
    key_paths: &[PathBuf],
    settings: &Settings,
) -> Result<BatchStatus> {
    let config = AppConfig::load(context::config_dir())?;
    let keys = batch_helpers::load_keys(key_paths);
    let request = BatchRequest::new(Mode::Decrypt, files, keys);
    batch_helpers::run(request, settings, &config)
}
