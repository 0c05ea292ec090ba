//! Built-in checks.
//!
//! Every module exposes a `register` function taking the shared registry.
//! Registration order inside a module is the report order of its checks.

pub mod certificate;
pub mod extensions;
pub mod public_suffix;

use crate::lint::Registry;

/// Register every built-in check.
pub fn register_all(registry: &Registry) {
    public_suffix::register(registry);
    certificate::register(registry);
    extensions::register(registry);
}
