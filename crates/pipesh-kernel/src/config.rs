//! Runner configuration.

use std::path::PathBuf;

use crate::scheduler::{CaptureBuffer, OutputSink, StdinMode};

/// Configuration for a [`PipelineRunner`](crate::PipelineRunner).
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Name of this shell (for identification in logs).
    pub name: String,

    /// Initial working directory.
    pub cwd: PathBuf,

    /// Program search path. `None` uses the host's `PATH`.
    pub path: Option<String>,

    /// Input for the first stage when nothing is redirected.
    pub stdin: StdinMode,

    /// Destination of the last stage's output when nothing is redirected.
    pub stdout: OutputSink,

    /// Destination of every stage's error output.
    pub stderr: OutputSink,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::repl()
    }
}

impl ShellConfig {
    /// Interactive config: the host's cwd and standard streams.
    pub fn repl() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self {
            name: "repl".to_string(),
            cwd,
            path: None,
            stdin: StdinMode::Inherit,
            stdout: OutputSink::Stdout,
            stderr: OutputSink::Stderr,
        }
    }

    /// Embedded config: detached stdin, stdout and stderr captured in memory.
    ///
    /// Retrieve the buffers with [`OutputSink::capture`].
    pub fn captured() -> Self {
        Self {
            name: "captured".to_string(),
            stdin: StdinMode::Null,
            stdout: OutputSink::Capture(CaptureBuffer::new()),
            stderr: OutputSink::Capture(CaptureBuffer::new()),
            ..Self::repl()
        }
    }

    /// Set the initial working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// Override the program search path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set how the first stage gets input.
    pub fn with_stdin(mut self, stdin: StdinMode) -> Self {
        self.stdin = stdin;
        self
    }

    /// Set the default output destination.
    pub fn with_stdout(mut self, stdout: OutputSink) -> Self {
        self.stdout = stdout;
        self
    }

    /// Set the error destination.
    pub fn with_stderr(mut self, stderr: OutputSink) -> Self {
        self.stderr = stderr;
        self
    }

    /// Effective search path.
    pub fn search_path(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| std::env::var("PATH").unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_detaches_and_captures() {
        let config = ShellConfig::captured();
        assert_eq!(config.stdin, StdinMode::Null);
        assert!(config.stdout.capture().is_some());
        assert!(config.stderr.capture().is_some());
    }

    #[test]
    fn path_override_wins() {
        let config = ShellConfig::repl().with_path("/opt/bin");
        assert_eq!(config.search_path(), "/opt/bin");
    }

    #[test]
    fn builders_replace_fields() {
        let config = ShellConfig::repl()
            .with_cwd("/tmp")
            .with_stdin(StdinMode::Null)
            .with_stdout(OutputSink::Null);
        assert_eq!(config.cwd, PathBuf::from("/tmp"));
        assert_eq!(config.stdin, StdinMode::Null);
        assert!(matches!(config.stdout, OutputSink::Null));
        assert!(matches!(config.stderr, OutputSink::Stderr));
    }
}
