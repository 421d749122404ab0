//! Stages backed by an OS process.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStdout, Command as ProcessCommand};
use tokio::task::JoinHandle;

use crate::scheduler::{StageInput, StageStream};
use crate::state::ShellState;

/// Exit code reported when no process could be spawned.
pub const SPAWN_FAILURE_CODE: i32 = 1;

/// A stage that runs an external program.
#[derive(Debug)]
pub struct ExternalStage {
    args: Vec<String>,
    child: Option<Child>,
    stdin_task: Option<JoinHandle<()>>,
}

impl ExternalStage {
    /// Create a stage for `args` (program first). Nothing runs until `start`.
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            child: None,
            stdin_task: None,
        }
    }

    fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    /// Spawn the process reading from `input`.
    ///
    /// Returns the process's output and error streams. A program that cannot
    /// be spawned yields an empty output stream and a one-line diagnostic on
    /// the error stream instead of an error.
    pub fn start(&mut self, input: StageInput, state: &ShellState) -> (StageStream, StageStream) {
        let program = self.program().to_string();
        let Some(executable) = resolve_program(&program, state) else {
            return self.spawn_failed(format!("{}: command not found", program));
        };

        let mut feed: Option<StageStream> = None;
        let stdin = match input {
            StageInput::Inherit => Stdio::inherit(),
            StageInput::Null => Stdio::null(),
            StageInput::File(file) => Stdio::from(file),
            StageInput::Stream(StageStream::Stdout(upstream)) => match pipe_to_stdio(upstream) {
                Ok(stdio) => stdio,
                Err(e) => return self.spawn_failed(format!("{}: {}", program, e)),
            },
            StageInput::Stream(stream) => {
                feed = Some(stream);
                Stdio::piped()
            }
        };

        let mut cmd = ProcessCommand::new(&executable);
        cmd.args(&self.args[1..])
            .current_dir(state.cwd())
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        cmd.arg0(&program);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return self.spawn_failed(format!("{}: command not found", program));
            }
            Err(e) => return self.spawn_failed(format!("{}: {}", program, e)),
        };
        tracing::debug!(
            program = %program,
            executable = %executable.display(),
            pid = child.id(),
            "spawned stage"
        );

        // In-memory input is copied in on its own task; dropping the
        // handle at the end closes the child's stdin.
        if let (Some(mut data), Some(mut child_stdin)) = (feed, child.stdin.take()) {
            self.stdin_task = Some(tokio::spawn(async move {
                if let Err(e) = tokio::io::copy(&mut data, &mut child_stdin).await {
                    tracing::debug!("stdin feed ended early: {}", e);
                }
            }));
        }

        let out = child.stdout.take().map(StageStream::Stdout).unwrap_or_else(StageStream::empty);
        let err = child.stderr.take().map(StageStream::Stderr).unwrap_or_else(StageStream::empty);
        self.child = Some(child);
        (out, err)
    }

    fn spawn_failed(&mut self, message: String) -> (StageStream, StageStream) {
        tracing::warn!("{}", message);
        (StageStream::empty(), StageStream::buffer(format!("{}\n", message)))
    }

    /// Wait for the process to exit and return its exit code.
    ///
    /// Returns [`SPAWN_FAILURE_CODE`] if nothing was spawned.
    pub async fn finish(&mut self) -> i32 {
        let Some(child) = self.child.as_mut() else {
            return SPAWN_FAILURE_CODE;
        };

        let code = match child.wait().await {
            Ok(status) => exit_code(status),
            Err(e) => {
                tracing::warn!(program = %self.program(), "wait failed: {}", e);
                1
            }
        };

        // The child is gone; a feed still blocked on a full pipe is useless.
        if let Some(task) = self.stdin_task.take() {
            task.abort();
        }
        code
    }
}

fn pipe_to_stdio(stdout: ChildStdout) -> io::Result<Stdio> {
    stdout.try_into()
}

/// Exit code of a finished process; `128 + signal` if it was killed.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or_else(|| {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            128 + status.signal().unwrap_or(0)
        }
        #[cfg(not(unix))]
        {
            -1
        }
    })
}

/// Locate the executable for `name`.
///
/// Names containing `/` resolve against the working directory; anything
/// else is searched for in the state's `PATH`.
fn resolve_program(name: &str, state: &ShellState) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    if name.contains('/') {
        let path = state.resolve_path(name);
        return path.exists().then_some(path);
    }
    resolve_in_path(name, state.search_path())
}

/// Find an executable named `name` in a colon-separated search path.
pub fn resolve_in_path(name: &str, path_var: &str) -> Option<PathBuf> {
    path_var
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|meta| meta.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        true
    }
}
