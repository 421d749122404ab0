//! pipesh-kernel: command pipelines for a small interactive shell.
//!
//! This crate provides:
//!
//! - **Command**: Immutable description of a program, its redirects and the
//!   command that feeds it
//! - **Scheduler**: Pipeline execution with concurrent stream relays
//! - **Stages**: External processes and in-process builtins behind one interface
//! - **Tools**: Builtin trait, registry, and the `cd`, `pwd` and `exit` builtins
//! - **State**: Working directory, last status and exit request shared with builtins
//!
//! ```no_run
//! use pipesh_kernel::{Command, PipelineRunner, ShellConfig};
//!
//! # async fn demo() -> pipesh_kernel::PipelineResult<()> {
//! let runner = PipelineRunner::new(ShellConfig::repl());
//! let cmd = Command::new("ls").pipe_to(["grep", "toml"]).write_to("hits.txt");
//! let code = runner.run(&cmd).await?;
//! assert_eq!(runner.last_status().await, Some(code));
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod stage;
pub mod state;
pub mod tools;

pub use command::{Command, IntoArgs, OutputRedirect};
pub use config::ShellConfig;
pub use error::{PipelineError, PipelineResult};
pub use scheduler::{CaptureBuffer, OutputSink, PipelineRunner, StageInput, StdinMode};
pub use state::{SharedState, ShellState};
pub use tools::{Builtin, BuiltinOutput, BuiltinRegistry};
