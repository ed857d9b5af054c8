use std::ffi::OsString;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::core::traits::engine::{Engine, EngineRun, ExitState};

/// How often a running engine is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long the output pipes may stay open once the engine is gone.
/// Anything it left running in the background is not waited for.
const PIPE_GRACE: Duration = Duration::from_secs(2);

/// Windows: keep the engine from flashing a console window.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Engine backend that shells out to the `age` binary.
///
/// Stdin is closed and both output pipes are drained on their own threads,
/// so a chatty engine can never block on a full pipe. On unix the engine
/// gets its own process group, and a run that outlives its timeout is
/// killed together with everything it spawned.
pub struct AgeProcess {
    /// Path to the age binary.
    binary: PathBuf,
}

impl AgeProcess {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, args: &[OsString]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }
}

/// Output collected from one pipe by a background reader.
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

impl Drain {
    /// Start reading `pipe` to the end on its own thread.
    fn start<R: Read + Send + 'static>(pipe: Option<R>) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&buf);
        std::thread::spawn(move || {
            if let Some(mut pipe) = pipe {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => match sink.lock() {
                            Ok(mut b) => b.extend_from_slice(&chunk[..n]),
                            Err(poisoned) => poisoned.into_inner().extend_from_slice(&chunk[..n]),
                        },
                        Err(e) if e.kind() == ErrorKind::Interrupted => {}
                        Err(e) => {
                            tracing::debug!(error = %e, "engine pipe closed with error");
                            break;
                        }
                    }
                }
            }
            let _ = tx.send(());
        });
        Self { buf, done }
    }

    /// Wait for end of stream until `until`, then return what was read.
    /// A reader still blocked at that point is abandoned.
    fn finish(self, until: Instant) -> Vec<u8> {
        let wait = until.saturating_duration_since(Instant::now());
        if let Err(mpsc::RecvTimeoutError::Timeout) = self.done.recv_timeout(wait) {
            tracing::debug!("engine pipe still held open, keeping partial output");
        }
        match self.buf.lock() {
            Ok(b) => b.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Kill the engine and, on unix, every process in its group.
fn kill_engine(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: plain syscall on a process group this process created.
            let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
            if rc != 0 {
                tracing::debug!(
                    pgid,
                    error = %std::io::Error::last_os_error(),
                    "could not signal engine process group"
                );
            }
        }
    }
    if let Err(e) = child.kill()
        && e.kind() != ErrorKind::InvalidInput
    {
        tracing::warn!(pid = child.id(), error = %e, "could not kill engine");
    }
    let _ = child.wait();
}

impl Engine for AgeProcess {
    fn run(&self, args: &[OsString], timeout: Duration) -> std::io::Result<EngineRun> {
        let mut child = self.command(args).spawn()?;
        let stdout = Drain::start(child.stdout.take());
        let stderr = Drain::start(child.stderr.take());

        // A timeout too large to represent is no deadline at all.
        let deadline = Instant::now().checked_add(timeout);
        let exit = loop {
            match child.try_wait() {
                Ok(Some(status)) => break ExitState::Exited(status.code()),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(pid = child.id(), error = %e, "lost track of engine process");
                    kill_engine(&mut child);
                    break ExitState::Exited(None);
                }
            }

            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    tracing::warn!(
                        pid = child.id(),
                        timeout_secs = timeout.as_secs(),
                        "engine timed out, killing it"
                    );
                    kill_engine(&mut child);
                    break ExitState::TimedOut;
                }
                Some(deadline) => POLL_INTERVAL.min(deadline - now),
                None => POLL_INTERVAL,
            };
            std::thread::sleep(pause);
        };

        let until = Instant::now() + PIPE_GRACE;
        Ok(EngineRun {
            exit,
            stdout: stdout.finish(until),
            stderr: stderr.finish(until),
        })
    }

    fn name(&self) -> &str {
        "age"
    }
}
