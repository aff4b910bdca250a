//! Process execution for composed invocations.
//!
//! stdout and stderr share one pipe so lines keep the order the console produced them.
//! Each run is bounded by an optional timeout and can be aborted through a [`CancelHandle`];
//! in both cases the child's whole process group is killed.

use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::invocation::Invocation;
use crate::config::{ConsoleConfig, ExecMode};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("spawn failed: {0}")]
    Spawn(#[source] io::Error),
    #[error("process io failed: {0}")]
    Io(#[from] io::Error),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("cancelled")]
    Cancelled,
}

/// Output lines and exit status of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    lines: Vec<String>,
    exit_status: i32,
}

impl ExecutionResult {
    pub fn new(lines: Vec<String>, exit_status: i32) -> Self {
        Self { lines, exit_status }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn exit_status(&self) -> i32 {
        self.exit_status
    }

    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Runs an invocation to completion, blocking the caller.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<ExecutionResult, RunError>;
}

/// Shared flag that aborts a running invocation when set.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previous cancellation so the handle can guard the next run.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Spawns the console as a child process, via `sh -c` or directly per [`ExecMode`].
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    mode: ExecMode,
    timeout: Option<Duration>,
    cancel: CancelHandle,
}

impl SubprocessRunner {
    pub fn new(mode: ExecMode, timeout: Option<Duration>) -> Self {
        Self {
            mode,
            timeout,
            cancel: CancelHandle::new(),
        }
    }

    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self::new(config.exec_mode, config.timeout())
    }

    /// Use `cancel` to abort runs from another thread.
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Cancellation or an elapsed timeout, measured from `started`.
    fn check_interrupt(&self, started: Instant) -> Result<(), RunError> {
        if self.cancel.is_cancelled() {
            return Err(RunError::Cancelled);
        }
        match self.timeout {
            Some(limit) if started.elapsed() >= limit => Err(RunError::TimedOut(limit)),
            _ => Ok(()),
        }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        match self.mode {
            ExecMode::Shell => {
                let mut c = Command::new("sh");
                c.arg("-c").arg(invocation.to_shell_line());
                c.stdin(Stdio::null());
                c
            }
            ExecMode::Direct => {
                let argv = invocation.argv();
                let mut c = Command::new(&argv[0]);
                c.args(&argv[1..]);
                c.stdin(if invocation.stdin().is_some() {
                    Stdio::piped()
                } else {
                    Stdio::null()
                });
                c
            }
        }
    }
}

impl ProcessRunner for SubprocessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ExecutionResult, RunError> {
        let (reader, writer) = io::pipe()?;
        let mut cmd = self.command(invocation);
        cmd.stdout(writer.try_clone()?).stderr(writer);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }
        let mut child = cmd.spawn().map_err(RunError::Spawn)?;
        // The parent's copies of the pipe writer live in `cmd`; drop them so the reader sees EOF.
        drop(cmd);

        if self.mode == ExecMode::Direct {
            if let (Some(mut stdin), Some(payload)) = (child.stdin.take(), invocation.stdin()) {
                let payload = payload.to_string();
                thread::spawn(move || {
                    if let Err(e) = stdin.write_all(payload.as_bytes()) {
                        log::debug!("writing console stdin failed: {}", e);
                    }
                });
            }
        }

        let (tx, output) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let mut reader = reader;
            let _ = tx.send(reader.read_to_end(&mut buf).map(|_| buf));
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    kill_group(&mut child);
                    return Err(RunError::Io(e));
                }
            }
            if let Err(e) = self.check_interrupt(started) {
                kill_group(&mut child);
                return Err(e);
            }
            thread::sleep(POLL_INTERVAL);
        };

        // A descendant may still hold the pipe open after the console exits.
        let buf = loop {
            match output.recv_timeout(POLL_INTERVAL) {
                Ok(read) => break read?,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(io::Error::other("output reader exited without a result").into())
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
            if let Err(e) = self.check_interrupt(started) {
                kill_group(&mut child);
                return Err(e);
            }
        };
        Ok(ExecutionResult::new(
            split_lines(&buf),
            status.code().unwrap_or(-1),
        ))
    }
}

/// Kill the child's process group (sudo, the console and anything they left behind),
/// then reap the child if it is still running.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        let pgid = child.id() as libc::pid_t;
        // SAFETY: killpg only signals; the group id is the child we spawned as group leader.
        let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        if rc != 0 {
            log::debug!("killpg({}) failed: {}", pgid, io::Error::last_os_error());
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Split output into lines with trailing whitespace removed from each.
fn split_lines(buf: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(buf)
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_trims_trailing_whitespace_only() {
        let lines = split_lines(b"Pool: name=Default  \r\n  PoolType=Backup\nquit\n");
        assert_eq!(lines, vec!["Pool: name=Default", "  PoolType=Backup", "quit"]);
    }

    #[test]
    fn split_lines_empty() {
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn cancel_handle_is_shared() {
        let a = CancelHandle::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
        b.reset();
        assert!(!a.is_cancelled());
    }

    #[test]
    fn execution_result_success() {
        assert!(ExecutionResult::new(vec![], 0).success());
        assert!(!ExecutionResult::new(vec!["x".into()], 1).success());
    }
}
