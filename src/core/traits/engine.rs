use std::ffi::OsString;
use std::time::Duration;

/// How an engine run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    /// The process exited on its own. `None` means it was killed by a signal.
    Exited(Option<i32>),
    /// The process was still running at the deadline and was terminated.
    TimedOut,
}

/// Everything observed from one engine run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRun {
    pub exit: ExitState,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl EngineRun {
    pub fn succeeded(&self) -> bool {
        self.exit == ExitState::Exited(Some(0))
    }

    /// Stderr decoded lossily and trimmed.
    pub fn diagnostic(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Port for the external encryption program.
///
/// Implementations live in `adapters::engine` (e.g. `AgeProcess`). The
/// orchestrator only depends on this trait, so tests can swap in a fake.
pub trait Engine: Send + Sync {
    /// Run the engine once with `args`, waiting at most `timeout`.
    ///
    /// Returns `Err` only if the process could not be started; every
    /// outcome of a started process, including a timeout, is an `EngineRun`.
    fn run(&self, args: &[OsString], timeout: Duration) -> std::io::Result<EngineRun>;

    /// Human-readable name of this engine (e.g. "age").
    fn name(&self) -> &str;
}
