use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;

use crate::adapters::collector::file_collector::FileCollector;
use crate::adapters::engine::age_process::AgeProcess;
use crate::adapters::engine::locator::EngineLocator;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::models::batch::{BatchEvent, BatchRequest};
use crate::core::models::key_material::KeyMaterial;
use crate::core::models::outcome::{BatchResult, BatchStatus, FileStatus};
use crate::core::services::batch_runner::{self, BatchRunner};
use crate::core::services::key_validator;

/// Global flags that shape how a batch runs and reports.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub engine: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub json: bool,
}

impl Settings {
    /// `--timeout` wins over the config file.
    pub fn timeout(&self, config: &AppConfig) -> Duration {
        self.timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.timeout())
    }

    /// `--engine` (or `AGEBATCH_ENGINE`) wins over `engine.path`.
    pub fn engine_override(&self, config: &AppConfig) -> Option<PathBuf> {
        self.engine.clone().or_else(|| config.engine.path.clone())
    }
}

/// Expand command-line paths into the files of a batch.
pub fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    FileCollector::new(paths.to_vec()).collect()
}

/// Classify every key file given on the command line.
pub fn load_keys(paths: &[PathBuf]) -> Vec<KeyMaterial> {
    paths.iter().map(key_validator::load).collect()
}

/// Run a batch end to end: validate, find the engine, process every file
/// with a progress bar, then print the result.
pub fn run(request: BatchRequest, settings: &Settings, config: &AppConfig) -> Result<BatchStatus> {
    let mode = request.mode;

    // Reject bad input before the engine is looked up.
    if let Err(e) = batch_runner::validate(&request) {
        let result = BatchResult::rejected(mode, e.to_string(), Utc::now());
        report(&result, settings.json)?;
        return Ok(result.status());
    }

    let binary = EngineLocator::from_env(settings.engine_override(config)).locate()?;
    let engine = AgeProcess::new(binary);
    output::detail(&format!("Using engine {}", engine.binary().display()));

    let runner = BatchRunner::new(engine).with_timeout(settings.timeout(config));

    let total = request.inputs.len();
    if !settings.json {
        output::header(&format!("{} of {total} file(s)", mode.display_name()));
    }

    let pb = output::progress_bar(total as u64, settings.json);
    let handle = runner.submit(request)?;
    let result = handle.wait_with(|event| match event {
        BatchEvent::Starting { file_name, .. } => pb.set_message(file_name.clone()),
        BatchEvent::Progress { fraction } => {
            pb.set_position((fraction * total as f64).round() as u64)
        }
        BatchEvent::Finished(_) => pb.finish_and_clear(),
    })?;

    report(&result, settings.json)?;
    Ok(result.status())
}

/// Print a finished batch, either for humans or as JSON on stdout.
pub fn report(result: &BatchResult, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(result).map_err(std::io::Error::from)?;
        println!("{text}");
    }

    if let Some(reason) = &result.rejection {
        output::error(&format!("{} aborted: {reason}", result.mode.display_name()));
        return Ok(());
    }
    if json {
        return Ok(());
    }

    for outcome in &result.outcomes {
        if let Some(out) = &outcome.output {
            output::success(&format!("{} → {}", outcome.file_name(), out.display()));
        }
    }
    for outcome in result.failures() {
        output::error(&format!(
            "{}: {}",
            outcome.file_name(),
            outcome.status.reason().unwrap_or_default()
        ));
        if let FileStatus::Failed {
            diagnostic: Some(raw),
            ..
        } = &outcome.status
        {
            output::detail(raw);
        }
    }

    let name = result.mode.display_name();
    match result.status() {
        BatchStatus::Succeeded => output::success(&format!(
            "{name} complete: {}/{} file(s)",
            result.success_count, result.total_count
        )),
        _ => output::warning(&format!(
            "{name} finished with errors: {} of {} file(s) failed",
            result.failure_count(),
            result.total_count
        )),
    }
    Ok(())
}
