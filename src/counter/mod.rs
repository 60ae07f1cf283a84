// Runs the external counting tool and turns its output into a number

mod parse;

pub use parse::parse_count;

use crate::models::{Config, CounterCommand};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Why a single entry has no count this tick.
#[derive(Debug, Error)]
pub enum CountError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{program} timed out after {:.1}s", .after.as_secs_f32())]
    Timeout { program: String, after: Duration },
    #[error("no count in output: {excerpt}")]
    Unparseable { excerpt: String },
    #[error("io error while counting: {0}")]
    Io(#[from] io::Error),
}

impl CountError {
    /// Short reason shown next to the placeholder.
    pub fn short_reason(&self) -> &'static str {
        match self {
            CountError::Spawn { .. } => "tool missing",
            CountError::Exit { .. } => "tool failed",
            CountError::Timeout { .. } => "timed out",
            CountError::Unparseable { .. } => "no count",
            CountError::Io(_) => "io error",
        }
    }
}

/// Narrow seam around the counting tool so the refresher can be tested without processes.
#[cfg_attr(test, mockall::automock)]
pub trait CountTool {
    fn fetch_count(&self, path: &Path) -> Result<u64, CountError>;
}

/// Counts by running a command with the source path appended, bounded by a timeout.
pub struct CommandCounter {
    command: CounterCommand,
    base_dir: PathBuf,
    timeout: Duration,
    pattern: Option<Regex>,
}

impl CommandCounter {
    pub fn new(command: CounterCommand, base_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            command,
            base_dir,
            timeout,
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: Option<Regex>) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.counter.clone(),
            config.base_dir.clone(),
            config.timeout,
        )
        .with_pattern(config.pattern.clone())
    }

    /// Runs the tool and returns its stdout once it exits successfully.
    fn run(&self, path: &Path) -> Result<String, CountError> {
        let program = &self.command.program;

        // Files, not pipes: the child is polled and must never block on a full pipe
        let stdout_file = NamedTempFile::new()?;
        let stderr_file = NamedTempFile::new()?;

        let mut command = Command::new(program);
        command
            .args(&self.command.args)
            .arg(path)
            .current_dir(&self.base_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file.reopen()?))
            .stderr(Stdio::from(stderr_file.reopen()?));
        // Own process group, so a timeout also takes down anything a wrapper script started
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|source| CountError::Spawn {
                program: program.clone(),
                source,
            })?;

        let start = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                terminate(&mut child);
                return Err(CountError::Timeout {
                    program: program.clone(),
                    after: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL.min(self.timeout - elapsed));
        };

        if !status.success() {
            let stderr = std::fs::read(stderr_file.path())?;
            return Err(CountError::Exit {
                program: program.clone(),
                status,
                stderr: parse::excerpt(&String::from_utf8_lossy(&stderr)),
            });
        }

        let stdout = std::fs::read(stdout_file.path())?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Kills the tool (and on unix its whole process group) and reaps it.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;
        if let Err(e) = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
            debug!(pid = child.id(), "failed to kill process group: {}", e);
        }
    }
    if let Err(e) = child.kill() {
        debug!(pid = child.id(), "failed to kill counting tool: {}", e);
    }
    if let Err(e) = child.wait() {
        debug!(pid = child.id(), "failed to reap counting tool: {}", e);
    }
}

impl CountTool for CommandCounter {
    fn fetch_count(&self, path: &Path) -> Result<u64, CountError> {
        debug!(program = %self.command.program, path = %path.display(), "running counting tool");
        let result = self
            .run(path)
            .and_then(|stdout| parse_count(&stdout, self.pattern.as_ref()));
        if let Err(e) = &result {
            warn!(path = %path.display(), "count unavailable: {}", e);
        }
        result
    }
}
