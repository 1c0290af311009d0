//! Structures that are used to construct other, more complicated types.
//! Generally zero-cost abstractions.

mod plugin;

pub use plugin::{PluginBuilder, StaticPlugin};
