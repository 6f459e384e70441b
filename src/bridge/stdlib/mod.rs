//! Native modules bundled with the interpreter
//!
//! `math` and `text` are available to every script run against
//! [`ModuleRegistry::new`]; embedders register their own modules alongside.

pub mod math;
pub mod text;

use crate::bridge::ModuleRegistry;

/// Register all bundled modules
pub fn register_all(registry: &mut ModuleRegistry) {
    registry.register(math::module());
    registry.register(text::module());
}
