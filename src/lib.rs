#![doc = include_str!("../README.md")]
#![deny(clippy::unwrap_used)]
#![allow(non_upper_case_globals)]
#![warn(clippy::pedantic)]
#![cfg_attr(docs, feature(doc_cfg))]

pub mod binding;
pub mod builders;
pub mod config;
pub mod describe;
pub mod error;
pub mod ffi;
pub mod flags;
pub mod log;
#[cfg(test)]
pub mod test;
pub mod thunk;
pub mod types;

/// A module typically glob-imported containing the typically required macros
/// and imports.
pub mod prelude {
    pub use crate::binding::{LifecycleHook, LoadedPlugin, load};
    pub use crate::builders::{PluginBuilder, StaticPlugin};
    pub use crate::config::BindingConfig;
    pub use crate::describe::{CallableUnit, PluginModule, PluginType, TypeInfo};
    pub use crate::error::{Error, Result};
    pub use crate::types::{NativePtr, ObjectHandle};
    pub use crate::{plugin_module, plugin_type};
}

/// `ue4ss-bindings` version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use ue4ss_bindings_derive::{plugin_module, plugin_type};
