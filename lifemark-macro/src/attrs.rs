use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{
    parse::Parse, parse::ParseStream, punctuated::Punctuated, Attribute, Ident, LitStr, Meta,
    Path, Token,
};

/// Where a marker attribute was written.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Site {
    Class,
    Field,
    Method,
}

impl Site {
    fn describe(self) -> &'static str {
        match self {
            Site::Class => "types",
            Site::Field => "fields",
            Site::Method => "methods",
        }
    }
}

/// One marker attribute, e.g. `#[resource("mailer")]`.
pub(crate) struct MarkerAttr {
    kind: Ident,
    value: Option<LitStr>,
    entries: Vec<LitStr>,
}

impl ToTokens for MarkerAttr {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let kind = &self.kind;
        let value = self.value.iter();
        let entries = &self.entries;
        tokens.extend(quote! {
            ::lifemark::Marker::new(::lifemark::MarkerKind::#kind)
                #(.with_value(#value))*
                #(.with_entry(#entries))*
        });
    }
}

/// Attribute name to marker kind, with the sites it may appear on.
const MARKERS: &[(&str, &str, &[Site])] = &[
    ("pre_configuration", "PreConfiguration", &[Site::Method]),
    ("post_construct", "PostConstruct", &[Site::Method]),
    ("pre_destroy", "PreDestroy", &[Site::Method]),
    ("warm_up", "WarmUp", &[Site::Method]),
    ("configuration", "Configuration", &[Site::Field]),
    ("configuration_variable", "ConfigurationVariable", &[Site::Field]),
    ("resource", "Resource", &[Site::Class, Site::Field, Site::Method]),
    ("resources", "Resources", &[Site::Class, Site::Field, Site::Method]),
];

pub(crate) fn is_marker(attr: &Attribute) -> bool {
    MARKERS.iter().any(|(name, _, _)| attr.path().is_ident(name))
}

/// Parses `attr` if it is a marker attribute. Errors when the marker does
/// not apply to `site` or its arguments are malformed.
pub(crate) fn parse_marker(attr: &Attribute, site: Site) -> syn::Result<Option<MarkerAttr>> {
    let Some((name, kind, sites)) = MARKERS
        .iter()
        .find(|(name, _, _)| attr.path().is_ident(name))
    else {
        return Ok(None);
    };
    if !sites.contains(&site) {
        return Err(syn::Error::new_spanned(
            attr,
            format!("#[{name}] cannot be used on {}", site.describe()),
        ));
    }

    let kind = Ident::new(kind, attr.path().segments[0].ident.span());
    let mut marker = MarkerAttr {
        kind,
        value: None,
        entries: Vec::new(),
    };

    match &attr.meta {
        Meta::Path(_) => {}
        Meta::List(list) if *name == "resources" => {
            marker.entries = list
                .parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?
                .into_iter()
                .collect();
        }
        Meta::List(list) if matches!(site, Site::Method) && *name != "resource" => {
            return Err(syn::Error::new_spanned(
                list,
                format!("#[{name}] takes no arguments"),
            ));
        }
        Meta::List(list) => marker.value = Some(list.parse_args()?),
        Meta::NameValue(nv) => {
            return Err(syn::Error::new_spanned(
                nv,
                format!("expected #[{name}] or #[{name}(\"...\")]"),
            ));
        }
    }

    Ok(Some(marker))
}

/// Collects every marker attribute in `attrs`.
pub(crate) fn markers(attrs: &[Attribute], site: Site) -> syn::Result<Vec<MarkerAttr>> {
    let mut found = Vec::new();
    for attr in attrs {
        if let Some(marker) = parse_marker(attr, site)? {
            found.push(marker);
        }
    }
    Ok(found)
}

/// A supertype in `implements(...)`: a path to a described type, or a
/// type name resolved through the loader at extraction time.
pub(crate) enum Supertype {
    Linked(Path),
    Named(LitStr),
}

impl Parse for Supertype {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(LitStr) {
            Ok(Supertype::Named(input.parse()?))
        } else {
            Ok(Supertype::Linked(input.parse()?))
        }
    }
}

impl ToTokens for Supertype {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        tokens.extend(match self {
            Supertype::Linked(path) => quote!(::lifemark::reflect::TypeRef::linked::<#path>()),
            Supertype::Named(name) => quote!(::lifemark::reflect::TypeRef::named(#name)),
        });
    }
}

/// Container options: `#[lifecycle(hooks, name = "...", implements(A, "b"))]`.
#[derive(Default)]
pub(crate) struct ContainerArgs {
    pub hooks: bool,
    pub name: Option<LitStr>,
    pub implements: Vec<Supertype>,
}

impl ContainerArgs {
    fn merge(&mut self, other: ContainerArgs) {
        self.hooks |= other.hooks;
        if other.name.is_some() {
            self.name = other.name;
        }
        self.implements.extend(other.implements);
    }

    pub(crate) fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut args = ContainerArgs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("lifecycle")) {
            args.merge(attr.parse_args()?);
        }
        Ok(args)
    }
}

impl Parse for ContainerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ContainerArgs::default();
        while !input.is_empty() {
            let name: Ident = input.parse()?;
            if name == "hooks" {
                args.hooks = true;
            } else if name == "name" {
                input.parse::<Token![=]>()?;
                args.name = Some(input.parse()?);
            } else if name == "implements" {
                let content;
                syn::parenthesized!(content in input);
                let items = content.parse_terminated(Supertype::parse, Token![,])?;
                args.implements.extend(items);
            } else {
                return Err(syn::Error::new(
                    name.span(),
                    "expected `hooks`, `name = \"...\"` or `implements(...)`",
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(args)
    }
}

/// Whether a field carries `#[lifecycle(parent)]`.
pub(crate) fn is_parent(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut parent = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("lifecycle")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("parent") {
                parent = true;
                Ok(())
            } else {
                Err(meta.error("expected `parent`"))
            }
        })?;
    }
    Ok(parent)
}

pub(crate) fn is_validated(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|a| a.path().is_ident("validate"))
}
