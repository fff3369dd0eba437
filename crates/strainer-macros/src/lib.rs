//! Derive macro for strainer filter schemas.

use proc_macro::TokenStream;

mod attrs;
mod filter;

/// Compile a struct declaration into a filter schema.
///
/// Each named field is one attribute of the schema. Its type gives the
/// annotation (`Option<T>` is optional, `Vec<T>` and sets are sequences,
/// another `#[derive(Filter)]` type is a nested filter) and its name is run
/// through the suffix definer unless a marker says otherwise.
///
/// Struct attributes, all optional:
/// `#[filter(name = "..", delimiter = "..", optional = bool,
/// default_filter_type = "..", default_search_type = "..")]`.
///
/// Field attributes:
/// - `#[filter(rename = "..", target = "..", op = "..")]` declares a filter
///   field; `target`/`op` form the marker.
/// - `#[search(targets = ["..", ..], op = "..")]` declares a search field.
/// - `#[filter(extends)]` on a field whose type derives `Filter` inherits that
///   schema; its values are merged into the populated filter.
/// - Both accept `default = expr`, `required`, `ge`/`gt`/`le`/`lt = number`,
///   `min_length`/`max_length = n`, `title`/`description = ".."`.
///
/// ```ignore
/// #[derive(Filter)]
/// struct UserFilter {
///     id: Option<i64>,
///     #[filter(rename = "name__ne")]
///     not_name: Option<String>,
///     #[search(targets = ["name", "email"])]
///     q: Option<String>,
///     group: Option<GroupFilter>,
/// }
/// ```
#[proc_macro_derive(Filter, attributes(filter, search))]
pub fn derive_filter(input: TokenStream) -> TokenStream {
    filter::derive_filter(input.into()).into()
}
