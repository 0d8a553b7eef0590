//! Built-in components for sluice chains.
//!
//! Every component declares its configuration attributes through the
//! attribute-spec system and is registered under a snake_case class name;
//! chain sections reference those names via their `class` key.

pub mod filters;
pub mod inputs;
pub mod outputs;

use sluice_core::ComponentRegistry;

pub use filters::archive::GzipExpander;
pub use filters::text::{LineToRecordFilter, RegexMatchFilter, RegexReplaceFilter};
pub use inputs::file::{DirectoryInput, LineFileInput};
pub use outputs::file::FileOutput;
pub use outputs::stdout::StdoutOutput;

/// Register every built-in component class.
pub fn register_builtins(registry: &mut ComponentRegistry) {
    registry.register(DirectoryInput::CLASS, DirectoryInput::factory);
    registry.register(LineFileInput::CLASS, LineFileInput::factory);
    registry.register(RegexMatchFilter::CLASS, RegexMatchFilter::factory);
    registry.register(RegexReplaceFilter::CLASS, RegexReplaceFilter::factory);
    registry.register(LineToRecordFilter::CLASS, LineToRecordFilter::factory);
    registry.register(GzipExpander::CLASS, GzipExpander::factory);
    registry.register(StdoutOutput::CLASS, StdoutOutput::factory);
    registry.register(FileOutput::CLASS, FileOutput::factory);
}

/// A registry pre-populated with every built-in component.
pub fn builtin_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    register_builtins(&mut registry);
    registry
}
