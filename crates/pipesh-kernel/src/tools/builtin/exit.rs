//! exit: Leave the shell.

use anyhow::bail;
use async_trait::async_trait;

use crate::scheduler::StageInput;
use crate::state::ShellState;
use crate::tools::{Builtin, BuiltinOutput};

/// Exit builtin: record a request for the front-end to terminate.
///
/// The host process is never terminated from inside a pipeline; the
/// front-end checks [`ShellState::exit_request`] after each run.
pub struct Exit;

#[async_trait]
impl Builtin for Exit {
    fn name(&self) -> &str {
        "exit"
    }

    fn description(&self) -> &str {
        "Exit the shell with the given status (default: last status)"
    }

    async fn run(
        &self,
        args: &[String],
        _stdin: StageInput,
        state: &mut ShellState,
    ) -> anyhow::Result<BuiltinOutput> {
        let code = match args {
            [] => state.last_status().unwrap_or(0),
            [code] => match code.parse::<i32>() {
                Ok(code) => code,
                Err(_) => bail!("exit: {}: numeric argument required", code),
            },
            _ => bail!("exit: too many arguments"),
        };

        state.request_exit(code);
        Ok(BuiltinOutput::success(""))
    }
}
