//! pwd: Print working directory.

use async_trait::async_trait;

use crate::scheduler::StageInput;
use crate::state::ShellState;
use crate::tools::{Builtin, BuiltinOutput};

/// Pwd builtin: print the shell's working directory.
pub struct Pwd;

#[async_trait]
impl Builtin for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn description(&self) -> &str {
        "Print current working directory"
    }

    async fn run(
        &self,
        _args: &[String],
        _stdin: StageInput,
        state: &mut ShellState,
    ) -> anyhow::Result<BuiltinOutput> {
        Ok(BuiltinOutput::success(format!("{}\n", state.cwd().display())))
    }
}
