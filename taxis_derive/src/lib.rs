mod shared;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input, spanned::Spanned};

use crate::shared::{converter_config, import_taxis, is_order_field, parse_converter_attrs};

/// Implements `FilterModel` from `#[taxis(entity = PATH, ...)]`.
///
/// The struct must also implement `serde::Serialize`; its serialized keys
/// are the field specs.
#[proc_macro_derive(FilterModel, attributes(taxis))]
pub fn derive_filter_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match generate_filter_model(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// Implements `OrderModel`. The order field is the one marked
/// `#[taxis(order_by)]`, or else the field named `order_by`.
#[proc_macro_derive(OrderModel, attributes(taxis))]
pub fn derive_order_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match generate_order_model(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn generate_filter_model(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let taxis = import_taxis();
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let attrs = parse_converter_attrs(&input.attrs)?;
    let config = converter_config(&attrs, ident.span())?;

    Ok(quote! {
        impl #impl_generics #taxis::FilterModel for #ident #ty_generics #where_clause {
            fn converter_config() -> #taxis::ConverterConfig {
                #config
            }
        }
    })
}

fn generate_order_model(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let taxis = import_taxis();
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(f) => &f.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "OrderModel only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "OrderModel only supports structs",
            ));
        }
    };

    let mut marked = None;
    for field in fields {
        if is_order_field(field)? {
            marked = Some(field);
            break;
        }
    }
    let order_field = marked
        .or_else(|| {
            fields
                .iter()
                .find(|f| f.ident.as_ref().is_some_and(|i| i == "order_by"))
        })
        .and_then(|f| f.ident.as_ref())
        .ok_or_else(|| {
            syn::Error::new(
                ident.span(),
                "No order field found. Either mark a field with #[taxis(order_by)] or name it 'order_by'",
            )
        })?;

    let attrs = parse_converter_attrs(&input.attrs)?;
    let config = converter_config(&attrs, ident.span())?;

    Ok(quote! {
        impl #impl_generics #taxis::OrderModel for #ident #ty_generics #where_clause {
            fn converter_config() -> #taxis::ConverterConfig {
                #config
            }

            fn order_by(&self) -> ::core::option::Option<#taxis::OrderBy> {
                #taxis::IntoOrderBy::into_order_by(&self.#order_field)
            }
        }
    })
}
