//! pipesh CLI entry point.
//!
//! Usage:
//!   pipesh                      # Interactive REPL
//!   pipesh -c <command>         # Execute one pipeline and exit

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pipesh_repl::{LineOutcome, Repl};

fn main() -> ExitCode {
    // Diagnostics go to stderr so they never mix with pipeline output
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None => {
            let code = pipesh_repl::run()?;
            Ok(exit_code(code))
        }

        Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!("pipesh {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }

        Some("-c") => {
            let cmd = args.get(2).context("-c requires a command argument")?;
            run_command(cmd)
        }

        Some(unknown) => {
            eprintln!("Unknown option: {unknown}");
            eprintln!("Run 'pipesh --help' for usage.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_help() {
    println!(
        r#"pipesh v{}

Usage:
  pipesh                       Interactive REPL
  pipesh -c <command>          Execute one pipeline and exit

Options:
  -c <command>                 Execute command string and exit
  -h, --help                   Show this help
  -V, --version                Show version

Syntax:
  cmd args | cmd args          Pipe output into the next command
  cmd < file                   Read input from file
  cmd > file, cmd >> file      Write or append output to file
  cd [dir|-], pwd, exit [n]    Builtins

Environment:
  RUST_LOG                     Log filter for diagnostics (default: warn)

Examples:
  pipesh -c 'ls -l | sort -k5 -n > sizes.txt'
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Execute a command string and exit with its status.
fn run_command(cmd: &str) -> Result<ExitCode> {
    let mut repl = Repl::new()?;
    let code = match repl.process_line(cmd)? {
        LineOutcome::Continue(code) => code.unwrap_or(0),
        LineOutcome::Exit(code) => code,
    };
    Ok(exit_code(code))
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}
