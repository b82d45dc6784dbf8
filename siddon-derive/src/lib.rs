use proc_macro::TokenStream;

mod record;

/// Derives `siddon::Record`, generating the compile-time field table and the
/// value extraction used by `siddon::parser::parse`.
///
/// Field helper attributes:
/// - `#[db("key")]` or `#[db = "key"]` names the storage key.
/// - `#[attr("required,min=2")]` or `#[attr = "..."]` holds comma-separated markers.
#[proc_macro_derive(Record, attributes(db, attr))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input.into()).into()
}
