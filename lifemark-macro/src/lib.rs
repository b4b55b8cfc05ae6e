use proc_macro::TokenStream;

mod attrs;
mod hooks;
mod lifecycle;

/// Derive macro describing a struct's lifecycle members
///
/// Implements `Described` and `Reflect`. Only fields that carry a marker or
/// `#[validate]` are described; marked fields must be `Clone`.
///
/// # Example
/// ```ignore
/// use lifemark::{hooks, Lifecycle};
///
/// #[derive(Lifecycle)]
/// #[resource("mail")]
/// #[lifecycle(hooks)]
/// pub struct Mailer {
///     #[lifecycle(parent)]
///     base: BaseService,
///     #[configuration("smtp.host")]
///     host: String,
///     #[validate]
///     from: String,
/// }
/// ```
#[proc_macro_derive(
    Lifecycle,
    attributes(lifecycle, configuration, configuration_variable, resource, resources, validate)
)]
pub fn derive_lifecycle(input: TokenStream) -> TokenStream {
    lifecycle::derive_lifecycle(input)
}

/// Attribute macro collecting lifecycle hooks from an impl block
///
/// Marked methods become method descriptors; pair with
/// `#[lifecycle(hooks)]` on the struct.
///
/// # Example
/// ```ignore
/// #[hooks]
/// impl Mailer {
///     #[post_construct]
///     fn connect(&mut self) -> anyhow::Result<()> { ... }
///
///     #[warm_up]
///     fn warm_templates() { ... }
/// }
/// ```
#[proc_macro_attribute]
pub fn hooks(attr: TokenStream, item: TokenStream) -> TokenStream {
    hooks::hooks_attribute(attr, item)
}
