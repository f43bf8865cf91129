mod attr;

use crate::{
    attr_parsing::parse_each_attr,
    component::attr::{parse_component_attrs, parse_inject_attrs, CapabilityArgs, ComponentArgs, RoleKw},
};

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, quote_spanned, ToTokens as _};
use syn::{ext::IdentExt as _, spanned::Spanned as _, Data, DeriveInput, Error, Fields, Ident, Index, LitStr, Member};

fn generate_role(args: &ComponentArgs) -> syn::Result<TokenStream> {
    let name = args.name.as_ref().map(|(_, name)| name);
    let Some(role) = &args.role else {
        return match &args.name {
            Some((kw, _)) => Err(Error::new_spanned(kw, "`name` requires a role")),
            None => Ok(quote! {}),
        };
    };

    let role_path = match role {
        RoleKw::Controller(kw) => quote_spanned! { kw.span => ::wirebox::Role::Controller },
        RoleKw::Service(kw) => quote_spanned! { kw.span => ::wirebox::Role::Service },
        RoleKw::Repository(kw) => quote_spanned! { kw.span => ::wirebox::Role::Repository },
        RoleKw::Advice(kw) => {
            return Ok(match name {
                Some(name) => quote_spanned! { kw.span => .named_advice(#name) },
                None => quote_spanned! { kw.span => .advice() },
            });
        }
    };

    Ok(match name {
        Some(name) => quote! { .named_role(#role_path, #name) },
        None => quote! { .role(#role_path) },
    })
}

fn generate_capabilities(ident: &Ident, capabilities: &[CapabilityArgs]) -> syn::Result<TokenStream> {
    let mut seen = Vec::with_capacity(capabilities.len());
    let mut calls = Vec::with_capacity(capabilities.len());
    for CapabilityArgs { ty, primary, implied } in capabilities {
        let key = ty.to_token_stream().to_string();
        if seen.contains(&key) {
            return Err(Error::new_spanned(ty, "capability is declared more than once"));
        }
        seen.push(key);

        let method = match (primary, implied) {
            (Some(_), _) => quote! { primary_capability },
            (None, Some(_)) => quote! { satisfies },
            (None, None) => quote! { capability },
        };
        calls.push(quote_spanned! { ty.span() =>
            .#method::<#ty>(|it: ::std::sync::Arc<#ident>| -> ::std::sync::Arc<#ty> { it })
        });
    }
    Ok(quote! { #( #calls )* })
}

fn generate_construct(args: &ComponentArgs) -> TokenStream {
    match &args.constructor {
        Some((_, path)) => quote_spanned! { path.span() =>
            #path().map_err(::core::convert::Into::into)
        },
        None => quote! {
            ::core::result::Result::Ok(<Self as ::core::default::Default>::default())
        },
    }
}

fn generate_injection_points(data: &Data) -> syn::Result<TokenStream> {
    let fields = match data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect::<Vec<_>>(),
            Fields::Unnamed(fields) => fields.unnamed.iter().collect(),
            Fields::Unit => Vec::new(),
        },
        Data::Enum(_) => Vec::new(),
        Data::Union(data) => return Err(Error::new_spanned(data.union_token, "unions can't be components")),
    };

    let mut points = Vec::new();
    for (index, field) in fields.into_iter().enumerate() {
        let Some(args) = parse_inject_attrs(&field.attrs) else {
            continue;
        };
        let args = args?;

        let (member, field_name) = match &field.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
            None => (Member::Unnamed(Index::from(index)), index.to_string()),
        };
        let field_name = LitStr::new(&field_name, Span::call_site());
        let kind = if args.optional.is_some() {
            quote! { optional }
        } else {
            quote! { required }
        };

        points.push(quote_spanned! { field.span() =>
            self.#member.#kind().field(#field_name)
        });
    }

    if points.is_empty() {
        return Ok(quote! {});
    }
    Ok(quote! {
        fn injection_points(&self) -> ::std::vec::Vec<::wirebox::InjectionPoint<'_>> {
            ::std::vec![ #( #points ),* ]
        }
    })
}

fn generate_entry_getter(ident: &Ident, role: &TokenStream, capabilities: &TokenStream) -> TokenStream {
    let getter_name = format_ident!("__WIREBOX_CANDIDATE_{}", ident.unraw().to_string().to_uppercase());

    quote_spanned! { ident.span() =>
        #[::wirebox_auto::entry_getters::distributed_slice(::wirebox_auto::entry_getters::__CANDIDATES)]
        #[linkme(crate = ::wirebox_auto::entry_getters::linkme)]
        static #getter_name: fn() -> ::wirebox::Candidate = || {
            ::wirebox::Candidate::of::<#ident>()
                #role
                #capabilities
                .build()
        };
    }
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let DeriveInput {
        ident,
        generics,
        attrs,
        data,
        ..
    } = input;

    if !generics.params.is_empty() {
        return Err(Error::new_spanned(generics, "generic components can't be discovered"));
    }

    let args = match parse_component_attrs(&attrs) {
        Some(args) => args?,
        None => ComponentArgs {
            role: None,
            name: None,
            constructor: None,
        },
    };
    let capabilities = parse_each_attr::<CapabilityArgs>("capability", &attrs)?;

    let role = generate_role(&args)?;
    let capabilities = generate_capabilities(&ident, &capabilities)?;
    let construct = generate_construct(&args);
    let injection_points = generate_injection_points(&data)?;
    let entry_getter = generate_entry_getter(&ident, &role, &capabilities);

    Ok(quote! {
        impl ::wirebox::Component for #ident {
            fn construct() -> ::core::result::Result<Self, ::wirebox::InstantiateErrorKind> {
                #construct
            }

            #injection_points
        }

        #entry_getter
    })
}
