use proc_macro2::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::parse::Parse;
use syn::{Attribute, Error, Expr, LitBool, LitInt, LitStr, Result, Token};

// -------------------------------------------------------------------------
// Struct attributes
// -------------------------------------------------------------------------

/// `#[filter(...)]` on the struct.
#[derive(Default)]
pub struct StructAttrs {
    pub name: Option<LitStr>,
    pub delimiter: Option<LitStr>,
    pub optional: Option<LitBool>,
    pub default_filter_type: Option<TokenStream>,
    pub default_search_type: Option<TokenStream>,
}

impl StructAttrs {
    pub fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut out = Self::default();
        for attr in attrs {
            if attr.path().is_ident("search") {
                return Err(Error::new_spanned(attr, "#[search] applies to fields only"));
            }
            if !attr.path().is_ident("filter") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    out.name = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("delimiter") {
                    out.delimiter = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("optional") {
                    out.optional = Some(meta.value()?.parse()?);
                } else if meta.path.is_ident("default_filter_type") {
                    out.default_filter_type = Some(filter_type(&meta.value()?.parse()?)?);
                } else if meta.path.is_ident("default_search_type") {
                    out.default_search_type = Some(search_type(&meta.value()?.parse()?)?);
                } else {
                    return Err(meta.error("unsupported filter attribute"));
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

// -------------------------------------------------------------------------
// Field attributes
// -------------------------------------------------------------------------

/// Descriptor metadata given on a field.
pub enum Marker {
    None,
    Filter {
        target: Option<LitStr>,
        op: Option<TokenStream>,
    },
    Search {
        targets: Vec<LitStr>,
        op: Option<TokenStream>,
    },
}

#[derive(Default)]
pub struct Bounds {
    pub ge: Option<Expr>,
    pub gt: Option<Expr>,
    pub le: Option<Expr>,
    pub lt: Option<Expr>,
    pub min_length: Option<LitInt>,
    pub max_length: Option<LitInt>,
    pub title: Option<LitStr>,
    pub description: Option<LitStr>,
}

impl Bounds {
    /// Parse one shared key; `false` if `meta` is not one of them.
    fn parse(&mut self, meta: &ParseNestedMeta<'_>) -> Result<bool> {
        let path = &meta.path;
        if path.is_ident("ge") {
            self.ge = Some(meta.value()?.parse()?);
        } else if path.is_ident("gt") {
            self.gt = Some(meta.value()?.parse()?);
        } else if path.is_ident("le") {
            self.le = Some(meta.value()?.parse()?);
        } else if path.is_ident("lt") {
            self.lt = Some(meta.value()?.parse()?);
        } else if path.is_ident("min_length") {
            self.min_length = Some(meta.value()?.parse()?);
        } else if path.is_ident("max_length") {
            self.max_length = Some(meta.value()?.parse()?);
        } else if path.is_ident("title") {
            self.title = Some(meta.value()?.parse()?);
        } else if path.is_ident("description") {
            self.description = Some(meta.value()?.parse()?);
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    /// `.constraints(..)` call, or nothing when no key was given.
    pub fn to_tokens(&self) -> TokenStream {
        let float = |name: &str, expr: &Option<Expr>| {
            let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
            expr.as_ref().map(|e| quote!(#ident: ::core::option::Option::Some((#e) as f64),))
        };
        let text = |name: &str, lit: &Option<LitStr>| {
            let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
            lit.as_ref().map(
                |l| quote!(#ident: ::core::option::Option::Some(::std::string::String::from(#l)),),
            )
        };
        let length = |name: &str, lit: &Option<LitInt>| {
            let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
            lit.as_ref().map(|l| quote!(#ident: ::core::option::Option::Some(#l),))
        };

        let entries: Vec<TokenStream> = [
            float("ge", &self.ge),
            float("gt", &self.gt),
            float("le", &self.le),
            float("lt", &self.lt),
            length("min_length", &self.min_length),
            length("max_length", &self.max_length),
            text("title", &self.title),
            text("description", &self.description),
        ]
        .into_iter()
        .flatten()
        .collect();

        if entries.is_empty() {
            return TokenStream::new();
        }
        quote! {
            .constraints(::strainer::Constraints {
                #(#entries)*
                ..::core::default::Default::default()
            })
        }
    }
}

/// `#[filter(...)]` or `#[search(...)]` on a field.
pub struct FieldAttrs {
    pub rename: Option<LitStr>,
    pub marker: Marker,
    pub default: Option<Expr>,
    pub required: bool,
    pub extends: bool,
    pub bounds: Bounds,
}

impl FieldAttrs {
    pub fn parse(attrs: &[Attribute]) -> Result<Self> {
        let mut out = Self {
            rename: None,
            marker: Marker::None,
            default: None,
            required: false,
            extends: false,
            bounds: Bounds::default(),
        };
        let mut seen: Option<&Attribute> = None;

        for attr in attrs {
            let is_filter = attr.path().is_ident("filter");
            let is_search = attr.path().is_ident("search");
            if !is_filter && !is_search {
                continue;
            }
            if seen.is_some_and(|first| first.path().is_ident("filter") != is_filter) {
                return Err(Error::new_spanned(
                    attr,
                    "a field is either a filter or a search field, not both",
                ));
            }
            seen = Some(attr);

            let mut target: Option<LitStr> = None;
            let mut targets: Option<Vec<LitStr>> = None;
            let mut op: Option<TokenStream> = None;

            attr.parse_nested_meta(|meta| {
                if out.bounds.parse(&meta)? {
                    return Ok(());
                }
                let path = &meta.path;
                if path.is_ident("rename") {
                    out.rename = Some(meta.value()?.parse()?);
                } else if path.is_ident("default") {
                    out.default = Some(meta.value()?.parse()?);
                } else if path.is_ident("required") {
                    out.required = true;
                } else if is_filter && path.is_ident("extends") {
                    out.extends = true;
                } else if is_filter && path.is_ident("target") {
                    target = Some(meta.value()?.parse()?);
                } else if is_filter && path.is_ident("op") {
                    op = Some(filter_type(&meta.value()?.parse()?)?);
                } else if is_search && path.is_ident("targets") {
                    let content;
                    let input = meta.value()?;
                    syn::bracketed!(content in input);
                    let list = content.parse_terminated(<LitStr as Parse>::parse, Token![,])?;
                    targets = Some(list.into_iter().collect());
                } else if is_search && path.is_ident("op") {
                    op = Some(search_type(&meta.value()?.parse()?)?);
                } else {
                    return Err(meta.error("unsupported field attribute"));
                }
                Ok(())
            })?;

            if is_search {
                let Some(targets) = targets else {
                    return Err(Error::new_spanned(attr, "#[search] requires `targets = [..]`"));
                };
                out.marker = Marker::Search { targets, op };
            } else if target.is_some() || op.is_some() {
                out.marker = Marker::Filter { target, op };
            }
        }

        if out.required && out.default.is_some() {
            return Err(Error::new_spanned(
                out.default.as_ref(),
                "`required` and `default` are mutually exclusive",
            ));
        }
        if out.extends && !matches!(out.marker, Marker::None) {
            return Err(Error::new(
                proc_macro2::Span::call_site(),
                "an `extends` field cannot carry a filter marker",
            ));
        }
        Ok(out)
    }
}

// -------------------------------------------------------------------------
// Operators
// -------------------------------------------------------------------------

fn filter_type(lit: &LitStr) -> Result<TokenStream> {
    let variant = match lit.value().as_str() {
        "eq" => quote!(Eq),
        "ne" => quote!(Ne),
        "null" => quote!(Null),
        "gt" => quote!(Gt),
        "ge" => quote!(Ge),
        "lt" => quote!(Lt),
        "le" => quote!(Le),
        "like" => quote!(Like),
        "ilike" => quote!(Ilike),
        other => {
            return Err(Error::new_spanned(lit, format!("unknown filter type `{other}`")));
        }
    };
    Ok(quote!(::strainer::FilterType::#variant))
}

fn search_type(lit: &LitStr) -> Result<TokenStream> {
    let variant = match lit.value().as_str() {
        "case_sensitive" => quote!(CaseSensitive),
        "case_insensitive" => quote!(CaseInsensitive),
        other => {
            return Err(Error::new_spanned(lit, format!("unknown search type `{other}`")));
        }
    };
    Ok(quote!(::strainer::SearchType::#variant))
}
