use crate::attrs::{self, ContainerArgs, MarkerAttr, Site};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Ident, Type, Visibility};

pub fn derive_lifecycle(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    generate_lifecycle_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// A field that takes part in lifecycle processing.
struct DescribedField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    public: bool,
    validated: bool,
    markers: Vec<MarkerAttr>,
}

impl DescribedField<'_> {
    /// Only marked fields are reachable; validated-only fields are described
    /// without accessors.
    fn accessible(&self) -> bool {
        !self.markers.is_empty()
    }
}

struct Parent<'a> {
    ident: &'a Ident,
    ty: &'a Type,
}

fn generate_lifecycle_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Lifecycle)] does not support generic types",
        ));
    }

    let fields: Vec<&Field> = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    struct_name,
                    "#[derive(Lifecycle)] only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "#[derive(Lifecycle)] can only be applied to structs",
            ))
        }
    };

    let args = ContainerArgs::from_attrs(&input.attrs)?;
    let class_markers = attrs::markers(&input.attrs, Site::Class)?;

    let mut parent = None;
    let mut described = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if attrs::is_parent(&field.attrs)? {
            if parent.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field can be marked #[lifecycle(parent)]",
                ));
            }
            if field.attrs.iter().any(attrs::is_marker) {
                return Err(syn::Error::new_spanned(
                    field,
                    "the parent field cannot carry markers",
                ));
            }
            parent = Some(Parent {
                ident,
                ty: &field.ty,
            });
            continue;
        }

        let markers = attrs::markers(&field.attrs, Site::Field)?;
        let validated = attrs::is_validated(&field.attrs);
        if markers.is_empty() && !validated {
            continue;
        }
        described.push(DescribedField {
            ident,
            ty: &field.ty,
            public: matches!(field.vis, Visibility::Public(_)),
            validated,
            markers,
        });
    }

    let type_name = match &args.name {
        Some(name) => quote!(#name),
        None => quote!(concat!(module_path!(), "::", stringify!(#struct_name))),
    };

    let described_impl = generate_described_impl(
        struct_name,
        &type_name,
        &args,
        &class_markers,
        parent.as_ref(),
        &described,
    );
    let reflect_impl = generate_reflect_impl(struct_name, &args, parent.as_ref(), &described);

    Ok(quote! {
        #described_impl
        #reflect_impl
    })
}

fn generate_described_impl(
    struct_name: &Ident,
    type_name: &TokenStream2,
    args: &ContainerArgs,
    class_markers: &[MarkerAttr],
    parent: Option<&Parent>,
    fields: &[DescribedField],
) -> TokenStream2 {
    let extends = parent.map(|parent| {
        let ty = parent.ty;
        quote!(.extends(::lifemark::reflect::TypeRef::linked::<#ty>()))
    });
    let implements = &args.implements;

    let field_descriptors = fields.iter().map(|field| {
        let name = field.ident.to_string();
        let ident = field.ident;
        let ty = field.ty;
        let markers = &field.markers;
        let private = (!field.public).then(|| quote!(.private()));
        let validated = field.validated.then(|| quote!(.validated()));
        let access = field.accessible().then(|| {
            quote! {
                .with_access(::lifemark::reflect::FieldAccess::Instance {
                    get: |this| {
                        this.downcast_ref::<Self>().map(|this| {
                            ::std::boxed::Box::new(::std::clone::Clone::clone(&this.#ident))
                                as ::lifemark::reflect::FieldValue
                        })
                    },
                    set: |this, value| {
                        let ::std::option::Option::Some(this) = this.downcast_mut::<Self>() else {
                            return ::std::result::Result::Err(value);
                        };
                        this.#ident = *value.downcast::<#ty>()?;
                        ::std::result::Result::Ok(())
                    },
                })
            }
        });

        quote! {
            ::lifemark::reflect::FieldDescriptor::new(#name, stringify!(#ty))
                #access
                #(.with_marker(#markers))*
                #private
                #validated
        }
    });

    let methods = args
        .hooks
        .then(|| quote!(.methods(<Self as ::lifemark::reflect::HookTable>::hook_methods())));

    quote! {
        impl ::lifemark::reflect::Described for #struct_name {
            const TYPE_NAME: &'static str = #type_name;

            fn descriptor() -> ::std::sync::Arc<::lifemark::reflect::ClassDescriptor> {
                static DESCRIPTOR: ::std::sync::OnceLock<
                    ::std::sync::Arc<::lifemark::reflect::ClassDescriptor>,
                > = ::std::sync::OnceLock::new();

                ::std::sync::Arc::clone(DESCRIPTOR.get_or_init(|| {
                    ::std::sync::Arc::new(
                        ::lifemark::reflect::ClassDescriptor::builder(
                            <Self as ::lifemark::reflect::Described>::TYPE_NAME,
                        )
                        .owned_by::<Self>()
                        #(.marker(#class_markers))*
                        #extends
                        #(.implements(#implements))*
                        #(.field(#field_descriptors))*
                        #methods
                        .build(),
                    )
                }))
            }
        }
    }
}

fn generate_reflect_impl(
    struct_name: &Ident,
    args: &ContainerArgs,
    parent: Option<&Parent>,
    fields: &[DescribedField],
) -> TokenStream2 {
    let own = quote! {
        match declaring {
            ::std::option::Option::None => true,
            ::std::option::Option::Some(declaring) => {
                declaring == <Self as ::lifemark::reflect::Described>::TYPE_NAME
            }
        }
    };

    // What to do once this type has no match: ask the parent, or give up.
    let (project, project_mut, invoke, get, set) = match parent {
        Some(Parent { ident, ty }) => (
            quote!(<#ty as ::lifemark::reflect::Reflect>::project(&self.#ident, ty)),
            quote!(<#ty as ::lifemark::reflect::Reflect>::project_mut(&mut self.#ident, ty)),
            quote!(<#ty as ::lifemark::reflect::Reflect>::reflect_invoke(&mut self.#ident, declaring, name)),
            quote!(<#ty as ::lifemark::reflect::Reflect>::reflect_get(&self.#ident, declaring, name)),
            quote!(<#ty as ::lifemark::reflect::Reflect>::reflect_set(&mut self.#ident, declaring, name, value)),
        ),
        None => {
            let none = quote!(::std::option::Option::None);
            (none.clone(), none.clone(), none.clone(), none.clone(), none)
        }
    };

    let dispatch = args.hooks.then(|| {
        quote! {
            if #own {
                if let ::std::option::Option::Some(result) =
                    <Self as ::lifemark::reflect::HookTable>::dispatch_hook(self, name)
                {
                    return ::std::option::Option::Some(result);
                }
            }
        }
    });

    let accessible: Vec<_> = fields.iter().filter(|f| f.accessible()).collect();
    let get_arms = accessible.iter().map(|field| {
        let ident = field.ident;
        let name = ident.to_string();
        quote! {
            #name => {
                return ::std::option::Option::Some(::std::boxed::Box::new(
                    ::std::clone::Clone::clone(&self.#ident),
                ));
            }
        }
    });
    let set_arms = accessible.iter().map(|field| {
        let ident = field.ident;
        let ty = field.ty;
        let name = ident.to_string();
        quote! {
            #name => {
                return ::std::option::Option::Some(
                    value.downcast::<#ty>().map(|value| self.#ident = *value),
                );
            }
        }
    });

    quote! {
        impl ::lifemark::reflect::Reflect for #struct_name {
            fn type_name(&self) -> &str {
                <Self as ::lifemark::reflect::Described>::TYPE_NAME
            }

            #[allow(unused_variables)]
            fn project(&self, ty: ::std::any::TypeId) -> ::std::option::Option<&dyn ::std::any::Any> {
                if ty == ::std::any::TypeId::of::<Self>() {
                    return ::std::option::Option::Some(self);
                }
                #project
            }

            #[allow(unused_variables)]
            fn project_mut(
                &mut self,
                ty: ::std::any::TypeId,
            ) -> ::std::option::Option<&mut dyn ::std::any::Any> {
                if ty == ::std::any::TypeId::of::<Self>() {
                    return ::std::option::Option::Some(self);
                }
                #project_mut
            }

            #[allow(unused_variables)]
            fn reflect_invoke(
                &mut self,
                declaring: ::std::option::Option<&str>,
                name: &str,
            ) -> ::std::option::Option<::lifemark::reflect::HookResult> {
                #dispatch
                #invoke
            }

            #[allow(unused_variables, clippy::match_single_binding)]
            fn reflect_get(
                &self,
                declaring: ::std::option::Option<&str>,
                name: &str,
            ) -> ::std::option::Option<::lifemark::reflect::FieldValue> {
                if #own {
                    match name {
                        #(#get_arms)*
                        _ => {}
                    }
                }
                #get
            }

            #[allow(unused_variables, clippy::match_single_binding)]
            fn reflect_set(
                &mut self,
                declaring: ::std::option::Option<&str>,
                name: &str,
                value: ::lifemark::reflect::FieldValue,
            ) -> ::std::option::Option<::std::result::Result<(), ::lifemark::reflect::FieldValue>> {
                if #own {
                    match name {
                        #(#set_arms)*
                        _ => {}
                    }
                }
                #set
            }
        }
    }
}
