//! cd: Change working directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;

use crate::scheduler::StageInput;
use crate::state::ShellState;
use crate::tools::{Builtin, BuiltinOutput};

/// Cd builtin: change the shell's working directory.
///
/// Only the shell state changes; the host process keeps its own directory.
/// Spawned programs start in the state's directory.
pub struct Cd;

#[async_trait]
impl Builtin for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn description(&self) -> &str {
        "Change current working directory (no operand: $HOME, -: previous)"
    }

    async fn run(
        &self,
        args: &[String],
        _stdin: StageInput,
        state: &mut ShellState,
    ) -> anyhow::Result<BuiltinOutput> {
        if args.len() > 1 {
            bail!("cd: too many arguments");
        }

        let target = args.first().map(String::as_str);
        let resolved: PathBuf = match target {
            None => PathBuf::from(std::env::var("HOME").context("cd: HOME not set")?),
            Some("-") => state
                .prev_cwd()
                .map(Path::to_path_buf)
                .context("cd: OLDPWD not set")?,
            Some(dir) => state.resolve_path(dir),
        };
        let shown = target.map(str::to_string).unwrap_or_else(|| resolved.display().to_string());

        match tokio::fs::metadata(&resolved).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => bail!("cd: {}: Not a directory", shown),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                bail!("cd: {}: No such file or directory", shown)
            }
            Err(e) => bail!("cd: {}: {}", shown, e),
        }

        let resolved = tokio::fs::canonicalize(&resolved).await.unwrap_or(resolved);
        state.set_cwd(resolved.clone());

        // `cd -` reports where it went, like bash
        if target == Some("-") {
            Ok(BuiltinOutput::success(format!("{}\n", resolved.display())))
        } else {
            Ok(BuiltinOutput::success(""))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn state_in(dir: &Path) -> ShellState {
        ShellState::new(dir.canonicalize().unwrap(), "")
    }

    #[tokio::test]
    async fn cd_subdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let mut state = state_in(dir.path());

        let result = Cd.run(&args(&["sub"]), StageInput::Null, &mut state).await.unwrap();
        assert!(result.ok());
        assert!(result.out.is_empty());
        assert_eq!(state.cwd(), dir.path().canonicalize().unwrap().join("sub"));
    }

    #[tokio::test]
    async fn cd_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = ShellState::new("/", "");
        let target = dir.path().canonicalize().unwrap();

        Cd.run(&args(&[target.to_str().unwrap()]), StageInput::Null, &mut state)
            .await
            .unwrap();
        assert_eq!(state.cwd(), target);
        assert_eq!(state.prev_cwd(), Some(Path::new("/")));
    }

    #[tokio::test]
    async fn cd_nonexistent_fails_and_keeps_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(dir.path());
        let before = state.cwd().to_path_buf();

        let err = Cd
            .run(&args(&["/nonexistent"]), StageInput::Null, &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "cd: /nonexistent: No such file or directory");
        assert_eq!(state.cwd(), before);
    }

    #[tokio::test]
    async fn cd_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), b"data").unwrap();
        let mut state = state_in(dir.path());

        let err = Cd
            .run(&args(&["file.txt"]), StageInput::Null, &mut state)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Not a directory"));
    }

    #[tokio::test]
    async fn cd_dash_toggles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let root = dir.path().canonicalize().unwrap();
        let mut state = ShellState::new(root.clone(), "");

        Cd.run(&args(&["sub"]), StageInput::Null, &mut state).await.unwrap();
        assert_eq!(state.cwd(), root.join("sub"));

        let result = Cd.run(&args(&["-"]), StageInput::Null, &mut state).await.unwrap();
        assert_eq!(state.cwd(), root);
        assert_eq!(result.out, format!("{}\n", root.display()));

        Cd.run(&args(&["-"]), StageInput::Null, &mut state).await.unwrap();
        assert_eq!(state.cwd(), root.join("sub"));
    }

    #[tokio::test]
    async fn cd_dash_without_previous() {
        let mut state = ShellState::new("/", "");
        let err = Cd.run(&args(&["-"]), StageInput::Null, &mut state).await.unwrap_err();
        assert!(err.to_string().contains("OLDPWD not set"));
    }

    #[tokio::test]
    async fn cd_too_many_arguments() {
        let mut state = ShellState::new("/", "");
        let err = Cd
            .run(&args(&["/a", "/b"]), StageInput::Null, &mut state)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "cd: too many arguments");
        assert_eq!(state.cwd(), Path::new("/"));
    }
}
