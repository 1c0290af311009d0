use proc_macro2::TokenStream;
use quote::quote;
use syn::{FnArg, ItemFn};

use crate::prelude::*;

pub fn parser(input: ItemFn) -> Result<TokenStream> {
    let sig = &input.sig;
    if sig.inputs.len() != 1 || matches!(sig.inputs.first(), Some(FnArg::Receiver(_))) {
        bail!(sig.inputs => "`#[plugin_module]` functions take exactly one `PluginBuilder` argument.");
    }
    if sig.asyncness.is_some() || sig.unsafety.is_some() || !sig.generics.params.is_empty() {
        bail!(sig => "`#[plugin_module]` functions must be plain, non-generic functions.");
    }
    let ident = &sig.ident;

    Ok(quote! {
        #input

        /// Entry point called by the host to load the plugin module.
        ///
        /// # Safety
        ///
        /// `events` must be null or point to the host's lifecycle slot array.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn ue4ss_plugin_load(
            events: *mut ::ue4ss_bindings::types::NativePtr,
        ) -> *const ::ue4ss_bindings::ffi::HostTables {
            unsafe {
                ::ue4ss_bindings::ffi::load_plugin(events, || {
                    #ident(::ue4ss_bindings::builders::PluginBuilder::new(
                        ::std::env!("CARGO_PKG_NAME"),
                        ::std::env!("CARGO_PKG_VERSION"),
                    ))
                    .build()
                })
            }
        }
    })
}
