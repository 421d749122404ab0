//! pipesh REPL: interactive front-end for the pipeline kernel.
//!
//! It handles:
//! - Line parsing into command chains (`|`, `<`, `>`, `>>`, quoting)
//! - Command execution via the [`PipelineRunner`]
//! - Honouring `exit` requests recorded by the kernel
//! - Command history via rustyline

pub mod parse;

use std::path::PathBuf;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::runtime::Runtime;

use pipesh_kernel::{PipelineRunner, ShellConfig};

pub use parse::{parse_line, ParseError};

/// What the front-end should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Keep reading. Carries the pipeline's exit code if one ran.
    Continue(Option<i32>),
    /// `exit` was run; terminate with this code.
    Exit(i32),
}

/// REPL state: one runner and the runtime it executes on.
pub struct Repl {
    runner: PipelineRunner,
    runtime: Runtime,
}

impl Repl {
    /// Create a REPL attached to the host's cwd and standard streams.
    pub fn new() -> Result<Self> {
        Self::with_config(ShellConfig::repl())
    }

    /// Create a REPL with a custom configuration.
    pub fn with_config(config: ShellConfig) -> Result<Self> {
        let runtime = Runtime::new().context("Failed to create tokio runtime")?;
        Ok(Self {
            runner: PipelineRunner::new(config),
            runtime,
        })
    }

    /// The runner executing parsed lines.
    pub fn runner(&self) -> &PipelineRunner {
        &self.runner
    }

    /// Parse and run one line.
    ///
    /// Parse errors and pipeline hard errors are returned as `Err`; a
    /// pipeline that merely fails is `Continue(Some(code))`.
    pub fn process_line(&mut self, line: &str) -> Result<LineOutcome> {
        let Some(cmd) = parse_line(line)? else {
            return Ok(LineOutcome::Continue(None));
        };

        let code = self.runtime.block_on(self.runner.run(&cmd))?;
        match self.runtime.block_on(self.runner.exit_request()) {
            Some(exit) => Ok(LineOutcome::Exit(exit)),
            None => Ok(LineOutcome::Continue(Some(code))),
        }
    }

    /// Status of the last pipeline, for leaving the shell at end of input.
    pub fn last_status(&self) -> i32 {
        self.runtime.block_on(self.runner.last_status()).unwrap_or(0)
    }

    /// Prompt showing the shell's working directory.
    pub fn prompt(&self) -> String {
        let state = self.runtime.block_on(self.runner.state().read());
        let cwd = state.cwd().display().to_string();
        let home = std::env::var("HOME").unwrap_or_default();
        let shown = match cwd.strip_prefix(home.as_str()) {
            Some(rest) if !home.is_empty() && (rest.is_empty() || rest.starts_with('/')) => {
                format!("~{}", rest)
            }
            _ => cwd,
        };
        format!("pipesh:{}$ ", shown)
    }
}

/// Save REPL history to disk.
fn save_history(rl: &mut Editor<(), DefaultHistory>, history_path: &Option<PathBuf>) {
    if let Some(path) = history_path {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create history directory: {}", e);
            }
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Failed to save history: {}", e);
        }
    }
}

/// Run the REPL until end of input or `exit`. Returns the exit code.
pub fn run() -> Result<i32> {
    let mut rl: Editor<(), DefaultHistory> =
        Editor::new().context("Failed to create editor")?;

    let history_path = directories::BaseDirs::new()
        .map(|b| b.data_dir().join("pipesh").join("history.txt"));
    if let Some(ref path) = history_path {
        if let Err(e) = rl.load_history(path) {
            // Missing on first run
            let is_not_found = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound);
            if !is_not_found {
                tracing::warn!("Failed to load history: {}", e);
            }
        }
    }

    let mut repl = Repl::new()?;

    loop {
        let prompt = repl.prompt();
        match rl.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                }

                match repl.process_line(&line) {
                    Ok(LineOutcome::Continue(_)) => {}
                    Ok(LineOutcome::Exit(code)) => {
                        save_history(&mut rl, &history_path);
                        return Ok(code);
                    }
                    Err(e) => eprintln!("pipesh: {:#}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("pipesh: {}", err);
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);
    Ok(repl.last_status())
}
