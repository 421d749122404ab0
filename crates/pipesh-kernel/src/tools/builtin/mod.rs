//! Built-in commands available in every shell.

mod cd;
mod exit;
mod pwd;

pub use cd::Cd;
pub use exit::Exit;
pub use pwd::Pwd;

use super::BuiltinRegistry;

/// Register all built-in commands with the registry.
pub fn register_builtins(registry: &mut BuiltinRegistry) {
    registry.register(Cd);
    registry.register(Exit);
    registry.register(Pwd);
}
