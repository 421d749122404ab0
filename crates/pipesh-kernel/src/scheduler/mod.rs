//! Scheduler: runs command chains.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    PipelineRunner                      │
//! │  input ─▶ ┌──────┐  pipe  ┌──────┐  pipe  ┌──────┐     │
//! │           │ cmd1 │───────▶│ cmd2 │───────▶│ cmd3 │──┐  │
//! │           └──┬───┘        └──┬───┘        └──┬───┘  │  │
//! │              │ err           │ err           │ err  │  │
//! │              ▼               ▼               ▼      ▼  │
//! │          StreamRelay     StreamRelay     StreamRelay   │
//! │              └───────────────┴───────┬───────┘      │  │
//! │                                      ▼              ▼  │
//! │                               stderr sink  out relay ─▶ stdout | file
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Adjacent external programs share an OS pipe directly; in-memory output
//! from a builtin is copied into the next process by a feed task.

mod pipeline;
mod relay;
mod stream;

pub use pipeline::PipelineRunner;
pub use relay::StreamRelay;
pub use stream::{CaptureBuffer, OutputSink, StageInput, StageStream, StdinMode};
