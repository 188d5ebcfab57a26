//! External command execution.
//!
//! Everything the tray does to the outside world goes through [`CommandRunner`]:
//! a blocking `run` bounded by a timeout, and a fire-and-forget `start` that only
//! reports whether the process could be launched.

use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// How often a blocking `run` checks whether its child has exited.
const POLL_STEP: Duration = Duration::from_millis(25);

/// Outcome of a single command invocation. `Ok(())` means exit status zero,
/// or for `start`, that the process was launched.
pub type CommandResult = Result<(), ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {}", describe_code(.code))]
    Status { program: String, code: Option<i32> },

    #[error("`{program}` did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExecError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::Timeout { .. })
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

/// Runs external commands on behalf of the prober and the service controller.
pub trait CommandRunner: Send {
    /// Run `program` to completion. A child still alive at `timeout` is killed
    /// and reported as [`ExecError::Timeout`].
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> CommandResult;

    /// Launch `program` without waiting for it.
    fn start(&self, program: &str, args: &[String]) -> CommandResult;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    fn spawn(program: &str, args: &[String]) -> Result<Child, ExecError> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], timeout: Duration) -> CommandResult {
        let mut child = Self::spawn(program, args)?;
        let deadline = Instant::now() + timeout;

        loop {
            match child.try_wait() {
                Ok(Some(status)) => return exit_result(program, status),
                Ok(None) => {
                    let now = Instant::now();
                    if now >= deadline {
                        cancel(program, child);
                        return Err(ExecError::Timeout {
                            program: program.to_string(),
                            timeout,
                        });
                    }
                    thread::sleep(POLL_STEP.min(deadline - now));
                }
                Err(source) => {
                    return Err(ExecError::Wait {
                        program: program.to_string(),
                        source,
                    });
                }
            }
        }
    }

    fn start(&self, program: &str, args: &[String]) -> CommandResult {
        let child = Self::spawn(program, args)?;
        reap_in_background(program, child);
        Ok(())
    }
}

fn exit_result(program: &str, status: ExitStatus) -> CommandResult {
    if status.success() {
        Ok(())
    } else {
        Err(ExecError::Status {
            program: program.to_string(),
            code: status.code(),
        })
    }
}

/// Kill a child that overran its timeout.
///
/// A setuid launcher such as `pkexec` cannot be signalled by its unprivileged
/// parent. In that case the child is left to finish on its own and reaped off
/// the caller's thread, so the caller never blocks past its deadline.
fn cancel(program: &str, mut child: Child) {
    match child.kill() {
        Ok(()) => {
            if let Err(e) = child.wait() {
                log::debug!("failed to reap timed-out `{program}`: {e}");
            }
        }
        Err(e) => {
            log::warn!("could not kill timed-out `{program}` (pid {}): {e}", child.id());
            reap_in_background(program, child);
        }
    }
}

fn reap_in_background(program: &str, mut child: Child) {
    let program = program.to_string();
    let pid = child.id();
    let spawned = thread::Builder::new()
        .name(format!("reap-{pid}"))
        .spawn(move || match child.wait() {
            Ok(status) => log::debug!("`{program}` (pid {pid}) exited: {status}"),
            Err(e) => log::debug!("failed to reap `{program}` (pid {pid}): {e}"),
        });
    if let Err(e) = spawned {
        log::debug!("no reaper thread for pid {pid}: {e}");
    }
}

/// Resolve `program` on `PATH`.
pub fn locate(program: &str) -> Option<PathBuf> {
    which::which(program).ok()
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn run_reports_zero_exit_as_success() {
        assert!(SystemRunner.run("sh", &sh("exit 0"), Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn run_reports_nonzero_exit_code() {
        let err = SystemRunner
            .run("sh", &sh("exit 3"), Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, ExecError::Status { code: Some(3), .. }), "{err}");
    }

    #[test]
    fn run_reports_missing_binary_as_spawn_error() {
        let err = SystemRunner
            .run("definitely-not-a-real-binary-xyz", &[], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }), "{err}");
    }

    #[test]
    fn run_kills_child_at_timeout() {
        let started = Instant::now();
        let err = SystemRunner
            .run("sleep", &["10".to_string()], Duration::from_millis(300))
            .unwrap_err();
        assert!(err.is_timeout(), "{err}");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn start_returns_without_waiting() {
        let started = Instant::now();
        SystemRunner.start("sleep", &["5".to_string()]).unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn start_ignores_the_child_exit_code() {
        assert!(SystemRunner.start("sh", &sh("exit 7")).is_ok());
    }

    #[test]
    fn start_surfaces_launch_failure() {
        let err = SystemRunner
            .start("definitely-not-a-real-binary-xyz", &[])
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }), "{err}");
    }

    #[test]
    fn error_messages_name_the_program() {
        let err = ExecError::Status {
            program: "pgrep".into(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "`pgrep` exited with exit code 1");
        let err = ExecError::Status {
            program: "pkexec".into(),
            code: None,
        };
        assert_eq!(err.to_string(), "`pkexec` exited with a signal");
    }

    #[test]
    fn locate_finds_sh() {
        assert!(locate("sh").is_some());
        assert!(locate("definitely-not-a-real-binary-xyz").is_none());
    }
}
