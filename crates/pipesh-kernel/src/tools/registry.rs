//! Name → builtin lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::traits::Builtin;

/// Builtins known to a runner, looked up before falling back to a process.
#[derive(Default)]
pub struct BuiltinRegistry {
    builtins: HashMap<String, Arc<dyn Builtin>>,
}

impl BuiltinRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the default builtins.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        super::register_builtins(&mut registry);
        registry
    }

    /// Register a builtin under its own name, replacing any previous one.
    pub fn register(&mut self, builtin: impl Builtin + 'static) {
        self.builtins.insert(builtin.name().to_string(), Arc::new(builtin));
    }

    /// Look up a builtin by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Builtin>> {
        self.builtins.get(name).cloned()
    }

    /// True if `name` is a builtin.
    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.builtins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("builtins", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_registered() {
        let registry = BuiltinRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["cd", "exit", "pwd"]);
        assert!(registry.contains("cd"));
        assert!(registry.get("ls").is_none());
    }

    #[test]
    fn empty_registry_has_nothing() {
        let registry = BuiltinRegistry::new();
        assert!(registry.names().is_empty());
        assert!(!registry.contains("pwd"));
    }
}
