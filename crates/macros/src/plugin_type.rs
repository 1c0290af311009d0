use darling::FromAttributes;
use darling::util::Flag;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{FnArg, GenericParam, ImplItem, ImplItemFn, ItemImpl, ReturnType, Type};

use crate::parsing::{PluginRename, RenameRule, ident_to_plugin_name};
use crate::prelude::*;

#[derive(FromAttributes, Debug, Default)]
#[darling(attributes(plugin), default)]
pub struct PluginTypeAttribute {
    name: Option<String>,
    namespace: Option<String>,
    private: Flag,
    change_case: Option<RenameRule>,
}

#[derive(FromAttributes, Debug, Default)]
#[darling(attributes(plugin), default)]
pub struct PluginFnAttribute {
    #[darling(flatten)]
    rename: PluginRename,
    skip: Flag,
}

pub fn parser(mut input: ItemImpl) -> Result<TokenStream> {
    let args = PluginTypeAttribute::from_attributes(&input.attrs)?;
    input.attrs.retain(|attr| !attr.path().is_ident("plugin"));

    if input.trait_.is_some() {
        bail!(input => "`#[plugin_type]` is only valid on inherent `impl` blocks.");
    }
    if !input.generics.params.is_empty() {
        bail!(input.generics => "`#[plugin_type]` does not support generic types.");
    }
    let path = match &*input.self_ty {
        Type::Path(ty) => ty.path.clone(),
        _ => bail!(input.self_ty => "`#[plugin_type]` is only valid for named types."),
    };
    let Some(last) = path.segments.last() else {
        bail!(input.self_ty => "`#[plugin_type]` is only valid for named types.");
    };
    let type_name = args
        .name
        .clone()
        .unwrap_or_else(|| ident_to_plugin_name(&last.ident));
    let rule = args.change_case.unwrap_or(RenameRule::Pascal);

    let mut units = Vec::new();
    for item in &mut input.items {
        let ImplItem::Fn(func) = item else {
            continue;
        };
        let attr = PluginFnAttribute::from_attributes(&func.attrs)?;
        func.attrs.retain(|attr| !attr.path().is_ident("plugin"));
        if attr.skip.is_present() {
            continue;
        }
        let name = attr
            .rename
            .rename(ident_to_plugin_name(&func.sig.ident), rule);
        units.push(Unit::new(name, func)?.generate());
    }

    let namespace = args.namespace.as_ref().map(|ns| quote! { .namespace(#ns) });
    let private = args.private.is_present().then(|| quote! { .private() });

    Ok(quote! {
        #input

        impl ::ue4ss_bindings::describe::PluginType for #path {
            fn type_info() -> ::ue4ss_bindings::describe::TypeInfo {
                ::ue4ss_bindings::describe::TypeInfo::new(#type_name)
                    #namespace
                    #private
                    #(.unit(#units))*
            }
        }
    })
}

/// A parameter or return type as the macro sees it.
enum UnitType {
    /// A type with a `NativeType` implementation.
    Native(TokenStream),
    /// Any other type, described by its source text.
    Named(Type),
}

impl UnitType {
    fn parse(ty: &Type) -> Self {
        let variant = match ty {
            Type::Tuple(tuple) if tuple.elems.is_empty() => Some("Void"),
            Type::Paren(inner) => return Self::parse(&inner.elem),
            Type::Path(path) if path.qself.is_none() => {
                path.path.segments.last().and_then(|segment| {
                    if !segment.arguments.is_none() {
                        return None;
                    }
                    match segment.ident.to_string().as_str() {
                        "bool" => Some("Bool"),
                        "i8" => Some("I8"),
                        "u8" => Some("U8"),
                        "i16" => Some("I16"),
                        "u16" => Some("U16"),
                        "i32" => Some("I32"),
                        "u32" => Some("U32"),
                        "i64" => Some("I64"),
                        "u64" => Some("U64"),
                        "f32" => Some("F32"),
                        "f64" => Some("F64"),
                        "ObjectHandle" => Some("Handle"),
                        _ => None,
                    }
                })
            }
            _ => None,
        };
        match variant {
            Some(variant) => {
                let variant = format_ident!("{variant}");
                Self::Native(quote! { ::ue4ss_bindings::types::TypeRef::#variant })
            }
            None => Self::Named(ty.clone()),
        }
    }

    fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    fn type_ref(&self) -> TokenStream {
        match self {
            Self::Native(tokens) => tokens.clone(),
            Self::Named(ty) => quote! {
                ::ue4ss_bindings::types::TypeRef::named(::std::stringify!(#ty))
            },
        }
    }
}

struct Unit<'a> {
    name: String,
    func: &'a ImplItemFn,
    params: Vec<(&'a Type, UnitType)>,
    ret: UnitType,
    is_public: bool,
    is_instance: bool,
    is_generic: bool,
}

impl<'a> Unit<'a> {
    fn new(name: String, func: &'a ImplItemFn) -> Result<Self> {
        let sig = &func.sig;
        if sig.variadic.is_some() {
            bail!(sig.variadic => "Variadic functions cannot be described to the host.");
        }

        let mut is_instance = false;
        let mut params = Vec::new();
        for input in &sig.inputs {
            match input {
                FnArg::Receiver(_) => is_instance = true,
                FnArg::Typed(pat) => params.push((&*pat.ty, UnitType::parse(&pat.ty))),
            }
        }
        let ret = match &sig.output {
            ReturnType::Default => UnitType::Native(quote! { ::ue4ss_bindings::types::TypeRef::Void }),
            ReturnType::Type(_, ty) => UnitType::parse(ty),
        };
        let is_generic = sig
            .generics
            .params
            .iter()
            .any(|param| !matches!(param, GenericParam::Lifetime(_)));

        Ok(Self {
            name,
            func,
            params,
            ret,
            is_public: matches!(func.vis, syn::Visibility::Public(_)),
            is_instance,
            is_generic,
        })
    }

    /// Whether a trampoline can call the function.
    fn is_bindable(&self) -> bool {
        let sig = &self.func.sig;
        !self.is_instance
            && !self.is_generic
            && sig.unsafety.is_none()
            && sig.asyncness.is_none()
            && self.params.len() <= 1
            && self.ret.is_native()
            && self.params.iter().all(|(_, ty)| ty.is_native())
    }

    fn generate(&self) -> TokenStream {
        let name = &self.name;
        let ident = &self.func.sig.ident;

        let unit = if self.is_bindable() {
            match self.params.first() {
                None => quote! {
                    ::ue4ss_bindings::describe::CallableUnit::function0(#name, || Self::#ident())
                },
                Some((ty, _)) => quote! {
                    ::ue4ss_bindings::describe::CallableUnit::function1(#name, |arg: #ty| Self::#ident(arg))
                },
            }
        } else {
            let params = self.params.iter().map(|(_, ty)| ty.type_ref());
            let ret = self.ret.type_ref();
            quote! {
                ::ue4ss_bindings::describe::CallableUnit::opaque(
                    #name,
                    ::std::vec![#(#params),*],
                    #ret,
                )
            }
        };

        let private = (!self.is_public).then(|| quote! { .private() });
        let instance = self.is_instance.then(|| quote! { .instance() });
        let generic = self.is_generic.then(|| quote! { .generic() });
        quote! { #unit #private #instance #generic }
    }
}
