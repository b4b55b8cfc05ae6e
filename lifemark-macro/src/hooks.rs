use crate::attrs::{self, MarkerAttr, Site};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, Visibility};

pub fn hooks_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = TokenStream2::from(attr);
    let mut input = parse_macro_input!(item as ItemImpl);

    let expanded = if !attr.is_empty() {
        Err(syn::Error::new_spanned(attr, "#[hooks] takes no arguments"))
    } else {
        generate_hooks_impl(&mut input)
    };

    expanded
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Receiver {
    Shared,
    Exclusive,
    Static,
}

struct Hook {
    ident: Ident,
    receiver: Receiver,
    public: bool,
    markers: Vec<MarkerAttr>,
}

fn generate_hooks_impl(input: &mut ItemImpl) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() || input.trait_.is_some() {
        return Err(syn::Error::new_spanned(
            &input.self_ty,
            "#[hooks] only supports inherent impls of non-generic types",
        ));
    }

    let mut hooks = Vec::new();
    for item in &mut input.items {
        if let ImplItem::Fn(method) = item {
            if let Some(hook) = collect_hook(method)? {
                hooks.push(hook);
            }
        }
    }

    let self_ty = &input.self_ty;
    let descriptors = hooks.iter().map(method_descriptor);
    let dispatch_arms = hooks
        .iter()
        .filter(|hook| hook.receiver != Receiver::Static)
        .map(|hook| {
            let ident = &hook.ident;
            let name = ident.to_string();
            quote! {
                #name => ::std::option::Option::Some(
                    ::lifemark::reflect::IntoHookResult::into_hook_result(Self::#ident(self)),
                ),
            }
        });

    Ok(quote! {
        #input

        impl ::lifemark::reflect::HookTable for #self_ty {
            fn hook_methods() -> ::std::vec::Vec<::lifemark::reflect::MethodDescriptor> {
                ::std::vec![#(#descriptors),*]
            }

            #[allow(unused_variables, clippy::match_single_binding)]
            fn dispatch_hook(
                &mut self,
                name: &str,
            ) -> ::std::option::Option<::lifemark::reflect::HookResult> {
                match name {
                    #(#dispatch_arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

/// Strips marker attributes from `method` and describes it if it is a hook.
///
/// Methods with a marker, or with a bare `#[hook]` (an implementation of an
/// interface member), are hooks. Everything else is left alone.
fn collect_hook(method: &mut ImplItemFn) -> syn::Result<Option<Hook>> {
    let markers = attrs::markers(&method.attrs, Site::Method)?;
    let plain = method.attrs.iter().any(|a| a.path().is_ident("hook"));
    method
        .attrs
        .retain(|a| !attrs::is_marker(a) && !a.path().is_ident("hook"));

    if markers.is_empty() && !plain {
        return Ok(None);
    }

    let sig = &method.sig;
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.asyncness,
            "lifecycle hooks must be synchronous",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "lifecycle hooks cannot be generic",
        ));
    }

    let mut inputs = sig.inputs.iter();
    let receiver = match inputs.next() {
        None => Receiver::Static,
        Some(FnArg::Receiver(receiver)) => match (&receiver.reference, &receiver.mutability) {
            (Some(_), Some(_)) => Receiver::Exclusive,
            (Some(_), None) => Receiver::Shared,
            (None, _) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "lifecycle hooks take `&self` or `&mut self`",
                ))
            }
        },
        Some(arg) => {
            return Err(syn::Error::new_spanned(arg, "lifecycle hooks take no arguments"))
        }
    };
    if let Some(arg) = inputs.next() {
        return Err(syn::Error::new_spanned(arg, "lifecycle hooks take no arguments"));
    }

    Ok(Some(Hook {
        ident: sig.ident.clone(),
        receiver,
        public: matches!(method.vis, Visibility::Public(_)),
        markers,
    }))
}

fn method_descriptor(hook: &Hook) -> TokenStream2 {
    let ident = &hook.ident;
    let name = ident.to_string();
    let markers = &hook.markers;
    let private = (!hook.public).then(|| quote!(.private()));

    let constructor = match hook.receiver {
        Receiver::Static => quote! {
            ::lifemark::reflect::MethodDescriptor::associated(#name, || {
                ::lifemark::reflect::IntoHookResult::into_hook_result(Self::#ident())
            })
        },
        Receiver::Shared | Receiver::Exclusive => quote! {
            ::lifemark::reflect::MethodDescriptor::instance(#name, |this| {
                let this = ::lifemark::reflect::downcast_target::<Self>(this)?;
                ::lifemark::reflect::IntoHookResult::into_hook_result(Self::#ident(this))
            })
        },
    };

    quote! {
        #constructor
            #(.with_marker(#markers))*
            #private
    }
}
