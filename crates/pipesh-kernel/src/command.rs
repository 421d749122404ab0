//! Command descriptors and the composition operators that build pipelines.
//!
//! A [`Command`] is a value: every composition method borrows the receiver
//! and returns a new command, so a command that has been handed out is never
//! observed changing. Pipelines are singly linked from the last stage back to
//! the first through `upstream`, which is shared rather than copied.
//!
//! ```text
//!   Command::new("ls")            ["ls"]
//!       .arg("-l")                ["ls", "-l"]
//!       .pipe_to(["grep", "rs"])  ["grep", "rs"] ──upstream──▶ ["ls", "-l"]
//!       .write_to("out.txt")      ... > out.txt
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod sealed {
    pub trait Sealed {}
}

/// Values that can be appended to a command's argument list.
///
/// Implemented for single strings and for sequences of strings. Anything
/// else is rejected at compile time.
pub trait IntoArgs: sealed::Sealed {
    /// Convert into owned arguments, preserving order.
    fn into_args(self) -> Vec<String>;
}

macro_rules! single_arg {
    ($($ty:ty),*) => {$(
        impl sealed::Sealed for $ty {}
        impl IntoArgs for $ty {
            fn into_args(self) -> Vec<String> {
                vec![self.to_string()]
            }
        }
    )*};
}

macro_rules! sequence_arg {
    ($($ty:ty),*) => {$(
        impl sealed::Sealed for $ty {}
        impl IntoArgs for $ty {
            fn into_args(self) -> Vec<String> {
                self.iter().map(|s| s.to_string()).collect()
            }
        }
    )*};
}

single_arg!(&str, String, &String);
sequence_arg!(Vec<&str>, &Vec<String>, &[&str], &[String]);

impl sealed::Sealed for Vec<String> {}
impl IntoArgs for Vec<String> {
    fn into_args(self) -> Vec<String> {
        self
    }
}

impl<const N: usize> sealed::Sealed for [&str; N] {}
impl<const N: usize> IntoArgs for [&str; N] {
    fn into_args(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> sealed::Sealed for [String; N] {}
impl<const N: usize> IntoArgs for [String; N] {
    fn into_args(self) -> Vec<String> {
        self.into()
    }
}

/// Where the final stage of a pipeline writes its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    /// Target file.
    pub path: PathBuf,
    /// Append instead of truncating.
    pub append: bool,
}

/// One stage of a pipeline plus a link to the stage feeding it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    args: Vec<String>,
    upstream: Option<Arc<Command>>,
    input: Option<PathBuf>,
    output: Option<OutputRedirect>,
}

impl Command {
    /// Create a command running `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            args: vec![program.into()],
            ..Self::default()
        }
    }

    /// Create a command from a full argument vector.
    pub fn from_args(args: impl IntoArgs) -> Self {
        Self {
            args: args.into_args(),
            ..Self::default()
        }
    }

    /// Append one argument or a sequence of arguments.
    pub fn arg(&self, value: impl IntoArgs) -> Self {
        let mut cmd = self.clone();
        cmd.args.extend(value.into_args());
        cmd
    }

    /// Read input from `path`.
    pub fn redirect_input(&self, path: impl Into<PathBuf>) -> Self {
        let mut cmd = self.clone();
        cmd.input = Some(path.into());
        cmd
    }

    /// Write output to `path`, appending when `append` is set.
    pub fn redirect_output(&self, path: impl Into<PathBuf>, append: bool) -> Self {
        let mut cmd = self.clone();
        cmd.output = Some(OutputRedirect {
            path: path.into(),
            append,
        });
        cmd
    }

    /// Shorthand for `redirect_output(path, false)`.
    pub fn write_to(&self, path: impl Into<PathBuf>) -> Self {
        self.redirect_output(path, false)
    }

    /// Shorthand for `redirect_output(path, true)`.
    pub fn append_to(&self, path: impl Into<PathBuf>) -> Self {
        self.redirect_output(path, true)
    }

    /// Feed this command's output into `next`.
    ///
    /// Strings and string sequences become a new command; an existing
    /// command is copied and its upstream replaced by `self`.
    pub fn pipe_to(&self, next: impl Into<Command>) -> Self {
        let mut cmd = next.into();
        cmd.upstream = Some(Arc::new(self.clone()));
        cmd
    }

    /// Full argument vector, program first.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Program name (`args[0]`).
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Arguments after the program name.
    pub fn operands(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }

    /// True if the command has no arguments and therefore does nothing.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The command feeding this one, if any.
    pub fn upstream(&self) -> Option<&Command> {
        self.upstream.as_deref()
    }

    /// Declared input redirect.
    pub fn input_redirect(&self) -> Option<&Path> {
        self.input.as_deref()
    }

    /// Declared output redirect.
    pub fn output_redirect(&self) -> Option<&OutputRedirect> {
        self.output.as_ref()
    }

    /// Every stage of the chain ending at `self`, first stage first.
    pub fn stages(&self) -> Vec<&Command> {
        let mut stages = vec![self];
        let mut current = self;
        while let Some(up) = current.upstream() {
            stages.push(up);
            current = up;
        }
        stages.reverse();
        stages
    }
}

impl From<&str> for Command {
    fn from(program: &str) -> Self {
        Command::new(program)
    }
}

impl From<String> for Command {
    fn from(program: String) -> Self {
        Command::new(program)
    }
}

impl From<Vec<String>> for Command {
    fn from(args: Vec<String>) -> Self {
        Command::from_args(args)
    }
}

impl From<Vec<&str>> for Command {
    fn from(args: Vec<&str>) -> Self {
        Command::from_args(args)
    }
}

impl From<&[&str]> for Command {
    fn from(args: &[&str]) -> Self {
        Command::from_args(args)
    }
}

impl<const N: usize> From<[&str; N]> for Command {
    fn from(args: [&str; N]) -> Self {
        Command::from_args(args)
    }
}

impl From<&Command> for Command {
    fn from(cmd: &Command) -> Self {
        cmd.clone()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(up) = self.upstream() {
            write!(f, "{} | ", up)?;
        }
        write!(f, "{}", self.args.join(" "))?;
        if let Some(input) = &self.input {
            write!(f, " < {}", input.display())?;
        }
        if let Some(out) = &self.output {
            let op = if out.append { ">>" } else { ">" };
            write!(f, " {} {}", op, out.path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_appends_in_order() {
        let split = Command::default().arg(["a"]).arg(vec!["b", "c"]);
        let whole = Command::default().arg(["a", "b", "c"]);
        assert_eq!(split.args(), whole.args());
        assert_eq!(whole.args(), &["a", "b", "c"]);
    }

    #[test]
    fn arg_accepts_owned_and_borrowed_strings() {
        let owned = String::from("x");
        let cmd = Command::new("echo")
            .arg("a")
            .arg(owned.clone())
            .arg(&owned)
            .arg(vec![String::from("y")])
            .arg(&["z"][..]);
        assert_eq!(cmd.args(), &["echo", "a", "x", "x", "y", "z"]);
    }

    #[test]
    fn composition_leaves_receiver_untouched() {
        let base = Command::default();
        let n1 = base.arg("x");
        let n2 = n1.arg("y");
        assert_eq!(n1.args(), &["x"]);
        assert_eq!(n2.args(), &["x", "y"]);
        assert!(base.is_empty());

        let redirected = n1.write_to("/tmp/out").redirect_input("/tmp/in");
        assert!(n1.output_redirect().is_none());
        assert!(n1.input_redirect().is_none());
        assert_eq!(redirected.input_redirect(), Some(Path::new("/tmp/in")));
    }

    #[test]
    fn redirect_output_records_append_flag() {
        let cmd = Command::new("echo");
        assert_eq!(
            cmd.write_to("out").output_redirect(),
            Some(&OutputRedirect { path: "out".into(), append: false })
        );
        assert!(cmd.append_to("out").output_redirect().is_some_and(|o| o.append));
        assert!(!cmd.redirect_output("out", false).output_redirect().is_some_and(|o| o.append));
    }

    #[test]
    fn pipe_to_string_builds_new_stage() {
        let head = Command::new("ls").arg("-l");
        let piped = head.pipe_to("wc");
        assert_eq!(piped.args(), &["wc"]);
        assert_eq!(piped.upstream(), Some(&head));

        let piped = head.pipe_to(["grep", "rs"]);
        assert_eq!(piped.args(), &["grep", "rs"]);
    }

    #[test]
    fn pipe_to_command_copies_target() {
        let head = Command::new("ls");
        let tail = Command::new("sort").arg("-r");
        let piped = head.pipe_to(&tail);
        assert_eq!(piped.args(), tail.args());
        assert!(tail.upstream().is_none());
        assert_eq!(piped.upstream(), Some(&head));
    }

    #[test]
    fn stages_are_listed_first_to_last() {
        let chain = Command::new("a").pipe_to("b").pipe_to("c");
        let names: Vec<_> = chain.stages().iter().filter_map(|c| c.program()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn shared_upstream_is_not_disturbed_by_branches() {
        let head = Command::new("a");
        let left = head.pipe_to("b");
        let right = head.pipe_to("c");
        assert_eq!(left.upstream(), right.upstream());
        assert_eq!(left.program(), Some("b"));
        assert_eq!(right.program(), Some("c"));
    }

    #[test]
    fn operands_skip_program() {
        assert_eq!(Command::new("cd").arg("/tmp").operands(), &["/tmp"]);
        assert!(Command::new("pwd").operands().is_empty());
        assert!(Command::default().operands().is_empty());
    }

    #[test]
    fn display_renders_chain() {
        let chain = Command::new("cat")
            .redirect_input("in.txt")
            .pipe_to(["tr", "a-z", "A-Z"])
            .append_to("out.txt");
        assert_eq!(chain.to_string(), "cat < in.txt | tr a-z A-Z >> out.txt");
    }
}
