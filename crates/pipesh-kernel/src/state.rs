//! Shell state shared between the pipeline runner and builtins.
//!
//! One `ShellState` exists per runner. The runner is the only writer of the
//! last exit status; builtins and the front-end read it through [`ShellState::var`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

/// Handle to a runner's state.
pub type SharedState = Arc<RwLock<ShellState>>;

/// Mutable state of one shell session.
#[derive(Debug, Clone)]
pub struct ShellState {
    cwd: PathBuf,
    prev_cwd: Option<PathBuf>,
    last_status: Option<i32>,
    exit_request: Option<i32>,
    path: String,
}

impl ShellState {
    /// Create state rooted at `cwd`, searching `path` for programs.
    pub fn new(cwd: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            prev_cwd: None,
            last_status: None,
            exit_request: None,
            path: path.into(),
        }
    }

    /// Wrap in a shareable handle.
    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Previous working directory, set by the last directory change.
    pub fn prev_cwd(&self) -> Option<&Path> {
        self.prev_cwd.as_deref()
    }

    /// Change directory, remembering the old one.
    pub fn set_cwd(&mut self, cwd: PathBuf) {
        let old = std::mem::replace(&mut self.cwd, cwd);
        self.prev_cwd = Some(old);
    }

    /// Resolve `path` against the working directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Program search path (colon separated).
    pub fn search_path(&self) -> &str {
        &self.path
    }

    /// Exit status of the most recent pipeline, if one has run.
    pub fn last_status(&self) -> Option<i32> {
        self.last_status
    }

    /// Publish the exit status of a finished pipeline.
    pub fn set_last_status(&mut self, code: i32) {
        self.last_status = Some(code);
    }

    /// Ask the front-end to terminate with `code`.
    pub fn request_exit(&mut self, code: i32) {
        self.exit_request = Some(code);
    }

    /// Pending exit request, if any.
    pub fn exit_request(&self) -> Option<i32> {
        self.exit_request
    }

    /// Read a shell variable.
    ///
    /// Supports `?` (last exit status), `PWD` and `OLDPWD`.
    pub fn var(&self, name: &str) -> Option<String> {
        match name {
            "?" => self.last_status.map(|code| code.to_string()),
            "PWD" => Some(self.cwd.to_string_lossy().into_owned()),
            "OLDPWD" => self.prev_cwd.as_ref().map(|p| p.to_string_lossy().into_owned()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_unset_until_published() {
        let mut state = ShellState::new("/", "");
        assert_eq!(state.var("?"), None);
        state.set_last_status(3);
        assert_eq!(state.var("?").as_deref(), Some("3"));
        assert_eq!(state.last_status(), Some(3));
    }

    #[test]
    fn set_cwd_tracks_previous() {
        let mut state = ShellState::new("/a", "");
        assert_eq!(state.var("OLDPWD"), None);
        state.set_cwd(PathBuf::from("/b"));
        assert_eq!(state.cwd(), Path::new("/b"));
        assert_eq!(state.prev_cwd(), Some(Path::new("/a")));
        assert_eq!(state.var("PWD").as_deref(), Some("/b"));
        assert_eq!(state.var("OLDPWD").as_deref(), Some("/a"));
    }

    #[test]
    fn resolve_path_joins_relative() {
        let state = ShellState::new("/work", "");
        assert_eq!(state.resolve_path("out.txt"), PathBuf::from("/work/out.txt"));
        assert_eq!(state.resolve_path("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn unknown_vars_are_none() {
        let state = ShellState::new("/", "");
        assert_eq!(state.var("HOME"), None);
    }
}
