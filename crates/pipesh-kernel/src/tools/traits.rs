//! Core builtin trait and result type.

use async_trait::async_trait;

use crate::scheduler::StageInput;
use crate::state::ShellState;

/// Complete output of a builtin run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuiltinOutput {
    /// Text for the output stream.
    pub out: String,
    /// Text for the error stream.
    pub err: String,
    /// Exit code. 0 means success.
    pub code: i32,
}

impl BuiltinOutput {
    /// Successful run producing `out`.
    pub fn success(out: impl Into<String>) -> Self {
        Self {
            out: out.into(),
            ..Self::default()
        }
    }

    /// Failed run with exit `code` and diagnostic `err`.
    pub fn failure(code: i32, err: impl Into<String>) -> Self {
        Self {
            out: String::new(),
            err: err.into(),
            code,
        }
    }

    /// True if the exit code is 0.
    pub fn ok(&self) -> bool {
        self.code == 0
    }
}

/// A command implemented inside the shell.
///
/// Builtins run to completion on the caller's task. An `Err` return is
/// reported on the stage's error stream with exit code 1.
#[async_trait]
pub trait Builtin: Send + Sync {
    /// Name the builtin is invoked by.
    fn name(&self) -> &str;

    /// One-line description for help output.
    fn description(&self) -> &str;

    /// Run with `args` (operands only, without the builtin's own name).
    async fn run(
        &self,
        args: &[String],
        stdin: StageInput,
        state: &mut ShellState,
    ) -> anyhow::Result<BuiltinOutput>;
}
