//! Pipeline execution.
//!
//! Stages are started first to last. Each stage's output becomes the next
//! stage's input, and its error stream gets a relay into the shared stderr
//! sink the moment it exists. The last stage's output gets a relay into the
//! redirect file or the configured stdout.
//!
//! Stages are then waited on first to last. A downstream stage may still be
//! reading from an upstream pipe, so the earliest stage is always waited on
//! first while every relay keeps draining. The last stage's exit code is the
//! pipeline's result.

use std::fs::{File, OpenOptions};
use std::sync::Arc;

use crate::command::Command;
use crate::config::ShellConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::stage::Stage;
use crate::state::{SharedState, ShellState};
use crate::tools::BuiltinRegistry;

use super::relay::StreamRelay;
use super::stream::{OutputSink, StageInput, StageStream, StdinMode};

/// A started stage and the relay draining its error stream.
struct RunningStage {
    stage: Stage,
    errors: StreamRelay,
}

/// Runs command chains against one shell state.
pub struct PipelineRunner {
    name: String,
    builtins: Arc<BuiltinRegistry>,
    state: SharedState,
    stdin: StdinMode,
    stdout: OutputSink,
    stderr: OutputSink,
}

impl PipelineRunner {
    /// Create a runner with the default builtins.
    pub fn new(config: ShellConfig) -> Self {
        Self::with_builtins(config, BuiltinRegistry::with_defaults())
    }

    /// Create a runner with a custom builtin registry.
    pub fn with_builtins(config: ShellConfig, builtins: BuiltinRegistry) -> Self {
        let state = ShellState::new(config.cwd.clone(), config.search_path()).shared();
        Self {
            name: config.name,
            builtins: Arc::new(builtins),
            state,
            stdin: config.stdin,
            stdout: config.stdout,
            stderr: config.stderr,
        }
    }

    /// Shell state shared with builtins.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Builtins consulted before external programs.
    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    /// Default output destination.
    pub fn stdout(&self) -> &OutputSink {
        &self.stdout
    }

    /// Error destination.
    pub fn stderr(&self) -> &OutputSink {
        &self.stderr
    }

    /// Exit status of the most recent run.
    pub async fn last_status(&self) -> Option<i32> {
        self.state.read().await.last_status()
    }

    /// Exit code requested by the `exit` builtin, if any.
    pub async fn exit_request(&self) -> Option<i32> {
        self.state.read().await.exit_request()
    }

    /// Run the pipeline ending at `cmd` and return its exit code.
    ///
    /// A command without arguments does nothing and returns 0. Redirect
    /// targets are opened before any stage starts; failing to open one is the
    /// only way this returns an error. Everything the stages wrote has
    /// reached its destination when this returns.
    #[tracing::instrument(level = "info", skip(self, cmd), fields(shell = %self.name, pipeline = %cmd), err)]
    pub async fn run(&self, cmd: &Command) -> PipelineResult<i32> {
        if cmd.is_empty() {
            return Ok(0);
        }

        let stages = cmd.stages();
        let Some((&terminal, upstream)) = stages.split_last() else {
            return Ok(0);
        };
        validate(upstream)?;
        let head = upstream.first().copied().unwrap_or(terminal);
        let (input, output) = self.open_redirects(head, terminal, upstream).await?;

        let mut running = Vec::with_capacity(upstream.len());
        let mut input = input;
        for (index, node) in upstream.iter().enumerate() {
            let (stage, out) = self.start_stage(index, node, input).await;
            running.push(stage);
            input = StageInput::Stream(out);
        }
        let (last, out) = self.start_stage(upstream.len(), terminal, input).await;
        let output = StreamRelay::start(relay_label(upstream.len(), terminal, "stdout"), out, output);

        for RunningStage { mut stage, errors } in running {
            let code = stage.finish().await;
            tracing::debug!(code, "upstream stage finished");
            errors.stop();
            errors.join().await;
        }

        let RunningStage { mut stage, errors } = last;
        let code = stage.finish().await;
        self.state.write().await.set_last_status(code);

        errors.stop();
        output.stop();
        errors.join().await;
        output.join().await;

        tracing::debug!(code, "pipeline finished");
        Ok(code)
    }

    async fn start_stage(
        &self,
        index: usize,
        node: &Command,
        input: StageInput,
    ) -> (RunningStage, StageStream) {
        let mut stage = Stage::for_command(node, &self.builtins);
        let (out, err) = stage.start(input, &self.state).await;
        let errors = StreamRelay::start(relay_label(index, node, "stderr"), err, self.stderr.clone());
        (RunningStage { stage, errors }, out)
    }

    /// Open the pipeline's input and output endpoints.
    ///
    /// The head's own input redirect wins over the terminal's; input
    /// redirects on any other stage are ignored because upstream output
    /// feeds them.
    async fn open_redirects(
        &self,
        head: &Command,
        terminal: &Command,
        upstream: &[&Command],
    ) -> PipelineResult<(StageInput, OutputSink)> {
        let state = self.state.read().await;

        let reader = if head.input_redirect().is_some() { head } else { terminal };
        for &node in upstream.iter().chain(Some(&terminal)) {
            if std::ptr::eq(node, reader) {
                continue;
            }
            if let Some(path) = node.input_redirect() {
                tracing::debug!(path = %path.display(), "ignoring input redirect on piped stage");
            }
        }
        let input_path = reader.input_redirect();

        let input = match input_path {
            Some(path) => {
                let path = state.resolve_path(path);
                File::open(&path)
                    .map(StageInput::File)
                    .map_err(|source| PipelineError::InputRedirect { path, source })?
            }
            None => self.stdin.input(),
        };

        let output = match terminal.output_redirect() {
            Some(redirect) => {
                let path = state.resolve_path(&redirect.path);
                let mut options = OpenOptions::new();
                if redirect.append {
                    options.append(true);
                } else {
                    options.write(true).truncate(true);
                }
                let file = options
                    .create(true)
                    .open(&path)
                    .map_err(|source| PipelineError::OutputRedirect { path, source })?;
                OutputSink::file(file)
            }
            None => self.stdout.clone(),
        };

        Ok((input, output))
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("name", &self.name)
            .field("builtins", &self.builtins)
            .field("stdin", &self.stdin)
            .finish_non_exhaustive()
    }
}

/// Reject chains whose non-terminal stages cannot be wired.
fn validate(upstream: &[&Command]) -> PipelineResult<()> {
    for node in upstream {
        if node.is_empty() {
            return Err(PipelineError::EmptyStage);
        }
        if node.output_redirect().is_some() {
            return Err(PipelineError::RedirectNotTerminal(node.args().join(" ")));
        }
    }
    Ok(())
}

fn relay_label(index: usize, node: &Command, stream: &str) -> String {
    format!("{}[{}]:{}", node.program().unwrap_or_default(), index, stream)
}
