//! Hard failures of a pipeline run.
//!
//! Only problems that leave no meaningful pipeline to run end up here.
//! Spawn failures and builtin failures are reported on the stage's error
//! stream instead and never abort the run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort a pipeline before any stage is started.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input redirect target could not be opened for reading.
    #[error("cannot read {}: {source}", path.display())]
    InputRedirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output redirect target could not be opened for writing.
    #[error("cannot write {}: {source}", path.display())]
    OutputRedirect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stage that feeds another stage declares an output redirect.
    #[error("output redirect on non-terminal stage: {0}")]
    RedirectNotTerminal(String),

    /// A stage that feeds another stage has no arguments.
    #[error("empty command in the middle of a pipeline")]
    EmptyStage,
}
