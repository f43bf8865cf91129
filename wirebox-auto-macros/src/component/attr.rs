use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::{
    parse::{Parse, ParseStream},
    Attribute, LitStr, Meta, Path, Token, Type,
};

use crate::attr_parsing::{combine_attribute, combine_flag, parse_assignment_attribute, parse_attrs, parse_flag_attribute, Combine};

pub(crate) mod kw {
    syn::custom_keyword!(controller);
    syn::custom_keyword!(service);
    syn::custom_keyword!(repository);
    syn::custom_keyword!(advice);
    syn::custom_keyword!(name);
    syn::custom_keyword!(constructor);
    syn::custom_keyword!(primary);
    syn::custom_keyword!(implied);
    syn::custom_keyword!(optional);
}

pub(crate) enum RoleKw {
    Controller(kw::controller),
    Service(kw::service),
    Repository(kw::repository),
    Advice(kw::advice),
}

impl ToTokens for RoleKw {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            Self::Controller(kw) => kw.to_tokens(tokens),
            Self::Service(kw) => kw.to_tokens(tokens),
            Self::Repository(kw) => kw.to_tokens(tokens),
            Self::Advice(kw) => kw.to_tokens(tokens),
        }
    }
}

fn set_role(out: &mut Option<RoleKw>, role: RoleKw) -> syn::Result<()> {
    if out.is_some() {
        return Err(syn::Error::new_spanned(role, "a component takes exactly one role"));
    }
    *out = Some(role);
    Ok(())
}

/// `#[component(service, name = "orders", constructor = Self::connect)]`
pub(crate) struct ComponentArgs {
    pub(super) role: Option<RoleKw>,
    pub(super) name: Option<(kw::name, LitStr)>,
    pub(super) constructor: Option<(kw::constructor, Path)>,
}

impl Parse for ComponentArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut role = None;
        let mut name = None;
        let mut constructor = None;

        while !input.is_empty() {
            let lh = input.lookahead1();
            if lh.peek(kw::controller) {
                set_role(&mut role, RoleKw::Controller(input.parse()?))?;
            } else if lh.peek(kw::service) {
                set_role(&mut role, RoleKw::Service(input.parse()?))?;
            } else if lh.peek(kw::repository) {
                set_role(&mut role, RoleKw::Repository(input.parse()?))?;
            } else if lh.peek(kw::advice) {
                set_role(&mut role, RoleKw::Advice(input.parse()?))?;
            } else if lh.peek(kw::name) {
                parse_assignment_attribute(input, &mut name)?;
            } else if lh.peek(kw::constructor) {
                parse_assignment_attribute(input, &mut constructor)?;
            } else {
                return Err(lh.error());
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(Self { role, name, constructor })
    }
}

impl Combine for ComponentArgs {
    fn combine(mut self, other: Self) -> syn::Result<Self> {
        let Self { role, name, constructor } = other;
        if let Some(role) = role {
            set_role(&mut self.role, role)?;
        }
        combine_attribute(&mut self.name, name)?;
        combine_attribute(&mut self.constructor, constructor)?;
        Ok(self)
    }
}

/// `#[capability(dyn PaymentGateway)]`, `#[capability(dyn PaymentGateway, primary)]`
/// or `#[capability(dyn PaymentGateway, implied)]`
pub(crate) struct CapabilityArgs {
    pub(super) ty: Type,
    pub(super) primary: Option<kw::primary>,
    pub(super) implied: Option<kw::implied>,
}

impl Parse for CapabilityArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ty = input.parse()?;
        let mut primary = None;
        let mut implied = None;

        if input.parse::<Option<Token![,]>>()?.is_some() && !input.is_empty() {
            let lh = input.lookahead1();
            if lh.peek(kw::primary) {
                parse_flag_attribute(input, &mut primary)?;
            } else if lh.peek(kw::implied) {
                parse_flag_attribute(input, &mut implied)?;
            } else {
                return Err(lh.error());
            }
            let _ = input.parse::<Option<Token![,]>>()?;
        }
        if !input.is_empty() {
            return Err(input.error("expected one of `primary`, `implied`"));
        }

        Ok(Self { ty, primary, implied })
    }
}

/// `#[inject]` or `#[inject(optional)]`
#[derive(Default)]
pub(crate) struct InjectArgs {
    pub(super) optional: Option<kw::optional>,
}

impl Parse for InjectArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut optional = None;

        while !input.is_empty() {
            let lh = input.lookahead1();
            if lh.peek(kw::optional) {
                parse_flag_attribute(input, &mut optional)?;
            } else {
                return Err(lh.error());
            }

            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(Self { optional })
    }
}

impl Combine for InjectArgs {
    fn combine(mut self, other: Self) -> syn::Result<Self> {
        combine_flag(&mut self.optional, other.optional)?;
        Ok(self)
    }
}

pub(crate) fn parse_component_attrs(attrs: &[Attribute]) -> Option<syn::Result<ComponentArgs>> {
    parse_attrs("component", attrs)
}

/// `None` if the field isn't an injection point.
pub(crate) fn parse_inject_attrs(attrs: &[Attribute]) -> Option<syn::Result<InjectArgs>> {
    let mut iter = attrs.iter().filter(|attr| attr.path().is_ident("inject")).map(|attr| match attr.meta {
        Meta::Path(_) => Ok(InjectArgs::default()),
        _ => attr.parse_args::<InjectArgs>(),
    });

    let first = match iter.next()? {
        Ok(first) => first,
        Err(err) => return Some(Err(err)),
    };
    Some(iter.try_fold(first, |out, next| out.combine(next?)))
}
