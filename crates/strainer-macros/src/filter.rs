use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Fields, Result};

use crate::attrs::{FieldAttrs, Marker, StructAttrs};

pub fn derive_filter(input: TokenStream) -> TokenStream {
    match expand(input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: TokenStream) -> Result<TokenStream> {
    let input: DeriveInput = syn::parse2(input)?;
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &input.generics,
            "Filter cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Filter can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new_spanned(
                ident,
                "Filter can only be derived for structs with named fields",
            ));
        }
    };

    let struct_attrs = StructAttrs::parse(&input.attrs)?;
    let schema_name = match &struct_attrs.name {
        Some(name) => name.value(),
        None => ident.to_string(),
    };
    let config = config_calls(&struct_attrs);

    let mut parent = None;
    let mut declarations = Vec::new();
    let mut to_data = Vec::new();

    for field in fields {
        let Some(field_ident) = &field.ident else {
            return Err(Error::new_spanned(field, "expected a named field"));
        };
        let ty = &field.ty;
        let attrs = FieldAttrs::parse(&field.attrs)?;

        if attrs.extends {
            if parent.is_some() {
                return Err(Error::new_spanned(field, "only one field can be `extends`"));
            }
            parent = Some(quote!(.extends(<#ty as ::strainer::Filter>::schema())));
            to_data.push(quote! {
                data.extend_unchecked(::strainer::Filter::to_data(&self.#field_ident));
            });
            continue;
        }

        let name = match &attrs.rename {
            Some(rename) => rename.value(),
            None => field_ident.unraw().to_string(),
        };

        let marker = match &attrs.marker {
            Marker::None => TokenStream::new(),
            Marker::Filter { target, op } => {
                let target = target.iter();
                let op = op.iter();
                quote! {
                    .filter(::strainer::filter::FilterMarker::new()
                        #(.target(#target))*
                        #(.op(#op))*)
                }
            }
            Marker::Search { targets, op } => {
                let op = op.iter();
                quote! {
                    .search(::strainer::filter::SearchMarker::new([#(#targets),*])
                        #(.op(#op))*)
                }
            }
        };
        let default = match (&attrs.default, attrs.required) {
            (Some(expr), _) => quote!(.default_value(#expr)),
            (None, true) => quote!(.required()),
            (None, false) => TokenStream::new(),
        };
        let constraints = attrs.bounds.to_tokens();

        declarations.push(quote! {
            .declare(
                ::strainer::filter::Declaration::new(
                    #name,
                    <#ty as ::strainer::Annotated>::annotation(),
                )
                #marker
                #default
                #constraints
            )
        });
        to_data.push(quote! {
            if let ::core::option::Option::Some(value) =
                ::strainer::IntoFieldValue::to_field_value(&self.#field_ident)
            {
                data.insert_unchecked(#name, value);
            }
        });
    }

    let parent = parent.unwrap_or_default();

    Ok(quote! {
        impl ::strainer::Filter for #ident {
            fn schema() -> &'static ::std::sync::Arc<::strainer::FilterSchema> {
                static SCHEMA: ::std::sync::LazyLock<::std::sync::Arc<::strainer::FilterSchema>> =
                    ::std::sync::LazyLock::new(|| {
                        ::strainer::FilterSchema::builder(#schema_name)
                            #(#config)*
                            #parent
                            #(#declarations)*
                            .build()
                            .unwrap_or_else(|err| {
                                panic!("invalid filter schema `{}`: {}", #schema_name, err)
                            })
                    });
                &SCHEMA
            }

            fn to_data(&self) -> ::strainer::FilterData {
                let mut data = ::strainer::FilterData::new(<Self as ::strainer::Filter>::schema());
                #(#to_data)*
                data
            }
        }

        impl ::strainer::Annotated for #ident {
            fn annotation() -> ::strainer::TypeAnnotation {
                ::strainer::TypeAnnotation::Filter(::std::sync::Arc::clone(
                    <Self as ::strainer::Filter>::schema(),
                ))
            }
        }

        impl ::strainer::IntoFieldValue for #ident {
            fn to_field_value(&self) -> ::core::option::Option<::strainer::FieldValue> {
                ::core::option::Option::Some(::strainer::FieldValue::Nested(
                    ::strainer::Filter::to_data(self),
                ))
            }
        }
    })
}

fn config_calls(attrs: &StructAttrs) -> Vec<TokenStream> {
    let mut calls = Vec::new();
    if let Some(delimiter) = &attrs.delimiter {
        calls.push(quote!(.delimiter(#delimiter)));
    }
    if let Some(optional) = &attrs.optional {
        calls.push(quote!(.optional(#optional)));
    }
    if let Some(filter_type) = &attrs.default_filter_type {
        calls.push(quote!(.default_filter_type(#filter_type)));
    }
    if let Some(search_type) = &attrs.default_search_type {
        calls.push(quote!(.default_search_type(#search_type)));
    }
    calls
}
