use proc_macro::TokenStream;
use quote::{quote, ToTokens};
use std::env::var_os;
use syn::parse::Parse;

mod attr_parsing;
mod component;

/// Implements `wirebox::Component` and registers the type for link-time discovery.
///
/// ```ignore
/// #[derive(Default, Component)]
/// #[component(service, name = "orders")]
/// #[capability(dyn OrderLookup)]
/// struct OrderService {
///     #[inject]
///     repository: Autowired<OrderRepository>,
///     #[inject(optional)]
///     audit: Autowired<dyn AuditLog>,
/// }
/// ```
#[proc_macro_derive(Component, attributes(component, capability, inject))]
pub fn derive_component(item: TokenStream) -> TokenStream {
    expand_with(item, component::expand)
}

fn expand_with<F, I, K>(input: TokenStream, f: F) -> TokenStream
where
    F: FnOnce(I) -> syn::Result<K>,
    I: Parse,
    K: ToTokens,
{
    expand(syn::parse(input).and_then(f))
}

fn expand<T>(result: syn::Result<T>) -> TokenStream
where
    T: ToTokens,
{
    match result {
        Ok(tokens) => {
            let tokens = (quote! { #tokens }).into();
            if var_os("MACROS_DEBUG").is_some() {
                eprintln!("{tokens}");
            }
            tokens
        }
        Err(err) => err.into_compile_error().into(),
    }
}
