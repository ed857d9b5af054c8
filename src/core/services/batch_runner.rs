use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Utc;

use crate::core::errors::{AgeBatchError, Result};
use crate::core::models::batch::{BatchEvent, BatchRequest, Mode, has_engine_extension};
use crate::core::models::key_material::KeyMaterial;
use crate::core::models::outcome::{
    BatchResult, FailureKind, FileOutcome, FileStatus, display_name,
};
use crate::core::services::diagnostics;
use crate::core::services::invocation_builder::{self, CommitError, PreparedInvocation};
use crate::core::traits::engine::{Engine, EngineRun, ExitState};

/// Per-file ceiling on how long the engine may run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Reason recorded when the engine reports success without writing output.
pub const MISSING_OUTPUT_REASON: &str = "engine reported success but produced no output";

/// Drives the engine over a batch of files, one at a time.
///
/// Every file is attempted; a failure only ever affects that file's
/// outcome. Ephemeral artifacts created for a file are removed before the
/// next file starts.
pub struct BatchRunner<E: Engine> {
    engine: Arc<E>,
    timeout: Duration,
    running: Arc<AtomicBool>,
}

impl<E: Engine> Clone for BatchRunner<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            timeout: self.timeout,
            running: Arc::clone(&self.running),
        }
    }
}

/// Clears the running flag when the batch worker exits, even by panic.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to a batch running on its worker thread.
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    worker: JoinHandle<()>,
}

impl BatchHandle {
    /// Deliver every event to `on_event` in order and return the final
    /// result once the worker has exited.
    pub fn wait_with(self, mut on_event: impl FnMut(&BatchEvent)) -> Result<BatchResult> {
        let mut result = None;
        for event in self.events.iter() {
            on_event(&event);
            if let BatchEvent::Finished(r) = event {
                result = Some(r);
            }
        }
        if self.worker.join().is_err() {
            tracing::error!("batch worker panicked");
        }
        result.ok_or(AgeBatchError::WorkerStopped)
    }

    /// Wait for the batch to finish, discarding intermediate events.
    pub fn wait(self) -> Result<BatchResult> {
        self.wait_with(|_| {})
    }
}

impl<E: Engine + 'static> BatchRunner<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
            timeout: DEFAULT_TIMEOUT,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the per-file timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether a submitted batch is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start a batch on a dedicated worker thread.
    ///
    /// Events are delivered through the returned handle in processing
    /// order. Fails with `BatchAlreadyRunning` while a previous batch from
    /// this runner is still active.
    pub fn submit(&self, request: BatchRequest) -> Result<BatchHandle> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AgeBatchError::BatchAlreadyRunning);
        }
        let guard = RunningGuard(Arc::clone(&self.running));

        let (tx, rx) = mpsc::channel();
        let runner = self.clone();
        let worker = std::thread::Builder::new()
            .name("agebatch-worker".into())
            .spawn(move || {
                let _guard = guard;
                runner.run(&request, &mut |event| {
                    // A dropped receiver must not stop the batch.
                    let _ = tx.send(event);
                });
            })?;

        Ok(BatchHandle {
            events: rx,
            worker,
        })
    }

    /// Run a batch on the current thread, reporting events to `sink`.
    ///
    /// The last event is always `Finished` with the returned result.
    pub fn run(&self, request: &BatchRequest, sink: &mut dyn FnMut(BatchEvent)) -> BatchResult {
        let started_at = Utc::now();

        if let Err(e) = validate(request) {
            tracing::warn!(mode = %request.mode, error = %e, "batch rejected");
            let result = BatchResult::rejected(request.mode, e.to_string(), started_at);
            sink(BatchEvent::Finished(result.clone()));
            return result;
        }

        let total = request.inputs.len();
        tracing::info!(
            mode = %request.mode,
            files = total,
            keys = request.keys.len(),
            "batch started"
        );

        let mut outcomes = Vec::with_capacity(total);
        for (index, input) in request.inputs.iter().enumerate() {
            sink(BatchEvent::Starting {
                index,
                file_name: display_name(input),
            });

            let outcome = self.process_file(request.mode, input, &request.keys);
            match &outcome.status {
                FileStatus::Succeeded => {
                    tracing::info!(input = %input.display(), output = ?outcome.output, "file done")
                }
                other => tracing::info!(
                    input = %input.display(),
                    reason = other.reason().unwrap_or_default(),
                    "file failed"
                ),
            }
            outcomes.push(outcome);

            sink(BatchEvent::Progress {
                fraction: (index + 1) as f64 / total as f64,
            });
        }

        let result = BatchResult::from_outcomes(request.mode, outcomes, started_at);
        tracing::info!(
            mode = %result.mode,
            succeeded = result.success_count,
            total = result.total_count,
            "batch finished"
        );
        sink(BatchEvent::Finished(result.clone()));
        result
    }

    /// Build, run, reconcile and clean up one file.
    fn process_file(&self, mode: Mode, input: &Path, keys: &[KeyMaterial]) -> FileOutcome {
        let mut prepared = match invocation_builder::build(mode, input, keys) {
            Ok(p) => p,
            Err(e) => {
                let kind = match e {
                    AgeBatchError::Io(_) => FailureKind::Io,
                    _ => FailureKind::Invocation,
                };
                return FileOutcome {
                    input: input.to_path_buf(),
                    status: FileStatus::failed(kind, e.to_string()),
                    output: None,
                };
            }
        };

        tracing::debug!(
            engine = self.engine.name(),
            args = %invocation_builder::render_args(prepared.args()),
            "running engine"
        );

        let (status, output) = match self.engine.run(prepared.args(), self.timeout) {
            Ok(run) => self.reconcile(&mut prepared, run),
            Err(e) => (
                FileStatus::failed(
                    FailureKind::Spawn,
                    format!("could not start {}: {e}", self.engine.name()),
                ),
                None,
            ),
        };

        prepared.cleanup();

        FileOutcome {
            input: input.to_path_buf(),
            status,
            output,
        }
    }

    /// Turn an engine run into a file status, committing output on success.
    fn reconcile(
        &self,
        prepared: &mut PreparedInvocation,
        run: EngineRun,
    ) -> (FileStatus, Option<PathBuf>) {
        match run.exit {
            ExitState::TimedOut => {
                let leftover = run.diagnostic();
                if !leftover.is_empty() {
                    tracing::debug!(stderr = %leftover, "engine output before timeout");
                }
                (
                    FileStatus::TimedOut {
                        reason: timeout_reason(self.timeout),
                    },
                    None,
                )
            }
            ExitState::Exited(Some(0)) => match prepared.commit() {
                Ok(path) => (FileStatus::Succeeded, Some(path)),
                Err(CommitError::MissingOutput) => (
                    FileStatus::failed(FailureKind::Postcondition, MISSING_OUTPUT_REASON),
                    None,
                ),
                Err(CommitError::Io(e)) => (
                    FileStatus::failed(
                        FailureKind::Io,
                        format!("could not move output into place: {e}"),
                    ),
                    None,
                ),
            },
            ExitState::Exited(code) => {
                let diagnostic = run.diagnostic();
                let reason = diagnostics::explain(&diagnostic, code);
                (
                    FileStatus::Failed {
                        kind: FailureKind::Process { exit_code: code },
                        reason,
                        diagnostic: (!diagnostic.is_empty()).then_some(diagnostic),
                    },
                    None,
                )
            }
        }
    }
}

/// Fixed diagnostic for a file whose engine run hit the ceiling.
pub fn timeout_reason(timeout: Duration) -> String {
    let secs = timeout.as_secs_f64();
    let unit = if secs == 1.0 { "second" } else { "seconds" };
    format!("engine did not finish within {secs} {unit} and was stopped")
}

/// Pre-flight checks, run once before any file is attempted.
///
/// The key set is fixed for the whole batch, so missing or mismatched keys
/// reject the batch here rather than failing every file.
pub fn validate(request: &BatchRequest) -> Result<()> {
    if request.inputs.is_empty() {
        return Err(AgeBatchError::NoFiles);
    }
    if let Some(missing) = request.inputs.iter().find(|p| !p.is_file()) {
        return Err(AgeBatchError::FileNotFound {
            path: missing.clone(),
        });
    }

    let encrypted = request
        .inputs
        .iter()
        .filter(|p| has_engine_extension(p))
        .count();
    let all = request.inputs.len();
    match request.mode {
        Mode::Decrypt if encrypted == 0 => return Err(AgeBatchError::NotEncrypted),
        Mode::Decrypt if encrypted < all => return Err(AgeBatchError::MixedFileTypes),
        Mode::Encrypt if encrypted == all => return Err(AgeBatchError::AlreadyEncrypted),
        Mode::Encrypt if encrypted > 0 => return Err(AgeBatchError::MixedFileTypes),
        _ => {}
    }

    let required = request.mode.required_key_kind();
    if request.keys.is_empty() {
        return Err(AgeBatchError::NoKeys {
            kind: required.label(),
        });
    }
    let invalid: Vec<String> = request
        .keys
        .iter()
        .filter(|k| !k.is(required))
        .map(|k| display_name(k.path()))
        .collect();
    if !invalid.is_empty() {
        return Err(AgeBatchError::InvalidKey {
            kind: required.label(),
            files: invalid.join(", "),
        });
    }

    Ok(())
}
