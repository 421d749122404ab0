//! Builtin command system.
//!
//! Builtins run inside the shell instead of spawning a process. The runner
//! consults the [`BuiltinRegistry`] with a stage's program name before
//! falling back to an external program.
//!
//! ```text
//! BuiltinRegistry
//! ├── cd    change the shell's working directory
//! ├── pwd   print it
//! └── exit  ask the front-end to terminate
//! ```

mod builtin;
mod registry;
mod traits;

pub use builtin::register_builtins;
pub use registry::BuiltinRegistry;
pub use traits::{Builtin, BuiltinOutput};
