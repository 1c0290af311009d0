//! Macros for the `ue4ss-bindings` crate.

macro_rules! err {
    ($span:expr => $($msg:tt)*) => {
        ::syn::Error::new(::syn::spanned::Spanned::span(&$span), format!($($msg)*))
    };
    ($($msg:tt)*) => {
        ::syn::Error::new(::proc_macro2::Span::call_site(), format!($($msg)*))
    };
}

macro_rules! bail {
    ($($tt:tt)*) => {
        return Err(err!($($tt)*))
    };
}

mod module;
mod parsing;
mod plugin_type;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use syn::{ItemFn, ItemImpl, parse_macro_input};

/// Describes the functions of an `impl` block to the binding engine.
///
/// The attribute implements `PluginType` for the type, so it can be added to a
/// plugin with `PluginBuilder::plugin_type`. Every function of the block
/// becomes a callable unit named in `PascalCase`; `start_mod` becomes the
/// `StartMod` lifecycle hook.
///
/// Functions without a receiver taking no arguments, or a single argument,
/// of the types `()`, `bool`, `i8` to `u64`, `f32`, `f64` and `ObjectHandle`
/// can be bound. Every other function is described without a body, so the
/// engine skips it, or rejects the load when it is named like a lifecycle
/// hook.
///
/// # Attributes
///
/// On the `impl` block, `#[plugin(...)]` accepts:
///
/// - `name = "..."` - name of the type, defaults to the Rust type name.
/// - `namespace = "..."` - namespace of the type.
/// - `private` - hides the type and all its functions from the host.
/// - `change_case = "..."` - renaming rule for function names, one of
///   `PascalCase` (default), `camelCase`, `snake_case` or `none`.
///
/// On a function, `#[plugin(...)]` accepts:
///
/// - `name = "..."` - name of the function.
/// - `skip` - leaves the function out of the description.
///
/// # Example
///
/// ```rust,ignore
/// use ue4ss_bindings::prelude::*;
///
/// pub struct Utils;
///
/// #[plugin_type]
/// #[plugin(namespace = "MyMod")]
/// impl Utils {
///     pub fn greet() -> i32 {
///         42
///     }
///
///     pub fn apply(object: ObjectHandle) -> bool {
///         !object.is_null()
///     }
///
///     #[plugin(skip)]
///     pub fn helper() {}
/// }
/// ```
#[proc_macro_attribute]
pub fn plugin_type(args: TokenStream, input: TokenStream) -> TokenStream {
    plugin_type_internal(args.into(), parse_macro_input!(input as ItemImpl)).into()
}

fn plugin_type_internal(args: TokenStream2, input: ItemImpl) -> TokenStream2 {
    if !args.is_empty() {
        return err!(args => "`#[plugin_type]` takes no arguments. Use `#[plugin(...)]` on the impl block.")
            .to_compile_error();
    }
    plugin_type::parser(input).unwrap_or_else(|e| e.to_compile_error())
}

/// Exports a plugin module to the host.
///
/// The annotated function receives a `PluginBuilder` named after the crate
/// and returns it with the plugin's types added. The attribute generates the
/// `ue4ss_plugin_load` entry point the host calls with its lifecycle slot
/// array; it returns the host tables, or null if the load failed.
///
/// # Example
///
/// ```rust,ignore
/// use ue4ss_bindings::prelude::*;
///
/// #[plugin_module]
/// pub fn plugin(module: PluginBuilder) -> PluginBuilder {
///     module.plugin_type::<Main>().plugin_type::<Utils>()
/// }
/// ```
#[proc_macro_attribute]
pub fn plugin_module(args: TokenStream, input: TokenStream) -> TokenStream {
    plugin_module_internal(args.into(), parse_macro_input!(input as ItemFn)).into()
}

fn plugin_module_internal(args: TokenStream2, input: ItemFn) -> TokenStream2 {
    if !args.is_empty() {
        return err!(args => "`#[plugin_module]` takes no arguments.").to_compile_error();
    }
    module::parser(input).unwrap_or_else(|e| e.to_compile_error())
}

mod prelude {
    pub(crate) type Result<T> = std::result::Result<T, syn::Error>;
}
