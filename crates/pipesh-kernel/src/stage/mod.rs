//! Runnable pipeline stages.
//!
//! A [`Stage`] is what a [`Command`] turns into at execution time. Both
//! variants expose the same two steps:
//!
//! - `start(input)` → `(output stream, error stream)`
//! - `finish()` → exit code
//!
//! The runner never needs to know which variant it drives.

mod builtin;
mod external;

pub use builtin::BuiltinStage;
pub use external::{resolve_in_path, ExternalStage, SPAWN_FAILURE_CODE};

use crate::command::Command;
use crate::scheduler::{StageInput, StageStream};
use crate::state::SharedState;
use crate::tools::BuiltinRegistry;

/// One live stage of a running pipeline.
#[derive(Debug)]
pub enum Stage {
    /// Spawned OS process.
    External(ExternalStage),
    /// In-process builtin.
    Builtin(BuiltinStage),
}

impl Stage {
    /// Pick the variant for `cmd`: a registered builtin if the program name
    /// matches one, otherwise an external program.
    pub fn for_command(cmd: &Command, builtins: &BuiltinRegistry) -> Self {
        let args = cmd.args().to_vec();
        match cmd.program().and_then(|name| builtins.get(name)) {
            Some(builtin) => Stage::Builtin(BuiltinStage::new(builtin, args)),
            None => Stage::External(ExternalStage::new(args)),
        }
    }

    /// Start the stage reading from `input`.
    pub async fn start(&mut self, input: StageInput, state: &SharedState) -> (StageStream, StageStream) {
        match self {
            Stage::External(stage) => {
                let state = state.read().await;
                stage.start(input, &state)
            }
            Stage::Builtin(stage) => {
                let mut state = state.write().await;
                stage.start(input, &mut state).await
            }
        }
    }

    /// Wait for the stage and return its exit code.
    pub async fn finish(&mut self) -> i32 {
        match self {
            Stage::External(stage) => stage.finish().await,
            Stage::Builtin(stage) => stage.finish(),
        }
    }
}
