use core::any;
use quote::ToTokens;
use syn::{
    parse::{Parse, ParseStream},
    Attribute, Token,
};

fn duplicate<K: ToTokens>(kw: &K) -> syn::Error {
    let name = any::type_name::<K>();
    let kw_name = name.rsplit("::").next().unwrap_or(name);
    syn::Error::new_spanned(kw, ["`", kw_name, "` specified more than once"].concat())
}

/// Parses `kw = value`.
pub(crate) fn parse_assignment_attribute<K, T>(input: ParseStream<'_>, out: &mut Option<(K, T)>) -> syn::Result<()>
where
    K: Parse + ToTokens,
    T: Parse,
{
    let kw = input.parse()?;
    input.parse::<Token![=]>()?;
    let inner = input.parse()?;

    if out.is_some() {
        return Err(duplicate(&kw));
    }
    *out = Some((kw, inner));

    Ok(())
}

/// Parses a bare `kw`.
pub(crate) fn parse_flag_attribute<K>(input: ParseStream<'_>, out: &mut Option<K>) -> syn::Result<()>
where
    K: Parse + ToTokens,
{
    let kw = input.parse()?;

    if out.is_some() {
        return Err(duplicate(&kw));
    }
    *out = Some(kw);

    Ok(())
}

pub(crate) trait Combine: Sized {
    fn combine(self, other: Self) -> syn::Result<Self>;
}

/// Parses every `#[ident(...)]` attribute and merges them into one.
pub(crate) fn parse_attrs<T>(ident: &str, attrs: &[Attribute]) -> Option<syn::Result<T>>
where
    T: Combine + Parse,
{
    let mut iter = attrs
        .iter()
        .filter(|attr| attr.meta.path().is_ident(ident))
        .map(|attr| (attr, attr.parse_args::<T>()));

    let first = match iter.next() {
        Some((_, Ok(first))) => first,
        Some((_, Err(err))) => return Some(Err(err)),
        None => return None,
    };

    Some(iter.try_fold(first, |out, (_, next)| out.combine(next?)))
}

/// Parses every `#[ident(...)]` attribute separately, for attributes that may repeat.
pub(crate) fn parse_each_attr<T: Parse>(ident: &str, attrs: &[Attribute]) -> syn::Result<Vec<T>> {
    attrs
        .iter()
        .filter(|attr| attr.meta.path().is_ident(ident))
        .map(Attribute::parse_args::<T>)
        .collect()
}

pub(crate) fn combine_attribute<K, T>(a: &mut Option<(K, T)>, b: Option<(K, T)>) -> syn::Result<()>
where
    K: ToTokens,
{
    if let Some((kw, inner)) = b {
        if a.is_some() {
            return Err(duplicate(&kw));
        }
        *a = Some((kw, inner));
    }
    Ok(())
}

pub(crate) fn combine_flag<K>(a: &mut Option<K>, b: Option<K>) -> syn::Result<()>
where
    K: ToTokens,
{
    if let Some(kw) = b {
        if a.is_some() {
            return Err(duplicate(&kw));
        }
        *a = Some(kw);
    }
    Ok(())
}
