//! Stages backed by an in-process builtin.

use std::sync::Arc;

use crate::scheduler::{StageInput, StageStream};
use crate::state::ShellState;
use crate::tools::Builtin;

/// A stage that runs a builtin to completion during `start`.
pub struct BuiltinStage {
    builtin: Arc<dyn Builtin>,
    args: Vec<String>,
    code: i32,
}

impl BuiltinStage {
    /// Create a stage running `builtin` with `args` (builtin name first).
    pub fn new(builtin: Arc<dyn Builtin>, args: Vec<String>) -> Self {
        Self {
            builtin,
            args,
            code: 0,
        }
    }

    /// Run the builtin and expose its text output as read-once streams.
    ///
    /// A builtin failure becomes the error stream's text and exit code 1.
    pub async fn start(
        &mut self,
        input: StageInput,
        state: &mut ShellState,
    ) -> (StageStream, StageStream) {
        let operands = self.args.get(1..).unwrap_or_default();
        match self.builtin.run(operands, input, state).await {
            Ok(output) => {
                self.code = output.code;
                (StageStream::buffer(output.out), StageStream::buffer(output.err))
            }
            Err(e) => {
                self.code = 1;
                let mut message = e.to_string();
                if !message.ends_with('\n') {
                    message.push('\n');
                }
                tracing::debug!(builtin = %self.builtin.name(), "builtin failed: {}", e);
                (StageStream::empty(), StageStream::buffer(message))
            }
        }
    }

    /// Exit code recorded by `start`. Never blocks.
    pub fn finish(&self) -> i32 {
        self.code
    }
}

impl std::fmt::Debug for BuiltinStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinStage")
            .field("builtin", &self.builtin.name())
            .field("args", &self.args)
            .field("code", &self.code)
            .finish()
    }
}
