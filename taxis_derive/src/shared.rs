use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Attribute, Expr, ExprLit, Field, Lit, Meta, Path, punctuated::Punctuated};

pub fn import_taxis() -> TokenStream {
    // This finds the taxis crate in the user's dependencies
    let found_crate = crate_name("taxis").unwrap_or(FoundCrate::Itself);

    match found_crate {
        FoundCrate::Itself => quote! { ::taxis },
        FoundCrate::Name(name) => {
            let ident = syn::Ident::new(&name, Span::call_site());
            quote! { ::#ident }
        }
    }
}

/// Options collected from every `#[taxis(...)]` on the container.
#[derive(Default)]
pub struct ConverterAttrs {
    pub entity: Option<Path>,
    pub wrap_like: bool,
    pub strict: bool,
    /// `None` when absent, fields with an optional element kind otherwise.
    pub list_as_string: Option<Vec<(String, Option<String>)>>,
}

fn taxis_args(attr: &Attribute) -> syn::Result<Punctuated<Meta, syn::Token![,]>> {
    attr.parse_args_with(Punctuated::<Meta, syn::Token![,]>::parse_terminated)
}

fn lit_str(expr: &Expr, key: &str) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(
            other,
            format!("{} must be a string literal", key),
        )),
    }
}

pub fn parse_converter_attrs(attrs: &[Attribute]) -> syn::Result<ConverterAttrs> {
    let mut parsed = ConverterAttrs::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("taxis")) {
        for meta in taxis_args(attr)? {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("entity") => match &nv.value {
                    Expr::Path(path) => parsed.entity = Some(path.path.clone()),
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "entity must be a path to a static EntityMeta",
                        ));
                    }
                },
                Meta::Path(path) if path.is_ident("wrap_like") => parsed.wrap_like = true,
                Meta::Path(path) if path.is_ident("strict") => parsed.strict = true,
                Meta::Path(path) if path.is_ident("list_as_string") => {
                    parsed.list_as_string.get_or_insert_with(Vec::new);
                }
                Meta::NameValue(nv) if nv.path.is_ident("list_as_string") => {
                    let raw = lit_str(&nv.value, "list_as_string")?;
                    let fields = parsed.list_as_string.get_or_insert_with(Vec::new);
                    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                        match entry.split_once(':') {
                            Some((field, kind)) => {
                                fields.push((field.trim().to_string(), Some(kind.trim().to_string())))
                            }
                            None => fields.push((entry.to_string(), None)),
                        }
                    }
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unknown taxis attribute, expected one of: entity, wrap_like, strict, list_as_string",
                    ));
                }
            }
        }
    }

    Ok(parsed)
}

/// Check if a field has #[taxis(order_by)] attribute
pub fn is_order_field(field: &Field) -> syn::Result<bool> {
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("taxis")) {
        for meta in taxis_args(attr)? {
            if let Meta::Path(path) = &meta {
                if path.is_ident("order_by") {
                    return Ok(true);
                }
            }
        }
    }
    Ok(false)
}

fn value_kind(kind: &str, taxis: &TokenStream) -> syn::Result<TokenStream> {
    match kind {
        "str" | "string" => Ok(quote!(#taxis::ValueKind::Str)),
        "int" => Ok(quote!(#taxis::ValueKind::Int)),
        "float" => Ok(quote!(#taxis::ValueKind::Float)),
        "bool" => Ok(quote!(#taxis::ValueKind::Bool)),
        "timestamp" | "datetime" => Ok(quote!(#taxis::ValueKind::Timestamp)),
        other => Err(syn::Error::new(
            Span::call_site(),
            format!(
                "Invalid value kind `{}`. Valid kinds: str, int, float, bool, timestamp",
                other
            ),
        )),
    }
}

/// Body of the generated `converter_config()`.
pub fn converter_config(attrs: &ConverterAttrs, span: Span) -> syn::Result<TokenStream> {
    let taxis = import_taxis();

    let entity = attrs
        .entity
        .as_ref()
        .ok_or_else(|| syn::Error::new(span, "ConverterConfig param 'entity' can't be None"))?;
    let wrap_like = attrs.wrap_like;
    let strict = attrs.strict;

    let list_as_string = match &attrs.list_as_string {
        None => quote!(::core::option::Option::None),
        Some(fields) if fields.is_empty() => {
            quote!(::core::option::Option::Some(#taxis::ListAsString::default()))
        }
        Some(fields) => {
            let names = fields.iter().map(|(name, _)| name);
            let mut expects = Vec::new();
            for (name, kind) in fields {
                if let Some(kind) = kind {
                    let kind = value_kind(kind, &taxis)?;
                    expects.push(quote!(.expect(#name, #kind)));
                }
            }
            quote! {
                ::core::option::Option::Some(
                    #taxis::ListAsString::new([#(#names),*]) #(#expects)*
                )
            }
        }
    };

    Ok(quote! {
        #taxis::ConverterConfig::new(&#entity).with_options(#taxis::ConverterOptions {
            wrap_like: #wrap_like,
            strict_operators: #strict,
            list_as_string: #list_as_string,
        })
    })
}
