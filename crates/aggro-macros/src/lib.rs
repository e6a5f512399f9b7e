//! Proc macros for Aggro.
//!
//! - [`Record`] - Generate a field accessor and field name constants for a
//!   struct so it can be filtered, grouped and aggregated.
//!
//! Usually reached through `aggro` with the `derive` feature enabled rather
//! than depended on directly.

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Record` trait for structs with named fields.
///
/// # Field Attributes
///
/// | Attribute | Effect |
/// |-----------|--------|
/// | (none) | field is read with `aggro::Value::from(field.clone())` |
/// | `#[record(skip)]` | field is not visible to pipelines |
/// | `#[record(rename = "name")]` | field is exposed under `name` |
/// | `#[record(with = "path")]` | field is converted by `fn(&T) -> aggro::Value` |
///
/// # Generated Code
///
/// 1. One `pub const` per visible field, in `SCREAMING_SNAKE_CASE`, holding
///    the field's record name
/// 2. An implementation of `Record::field()`; unknown names return
///    `Value::Undefined`
///
/// # Example
///
/// ```ignore
/// use aggro::{Aggro, Record, Value};
///
/// #[derive(Clone, Copy)]
/// enum Channel { Web, Store }
///
/// fn channel(c: &Channel) -> Value {
///     match c {
///         Channel::Web => Value::from("web"),
///         Channel::Store => Value::from("store"),
///     }
/// }
///
/// #[derive(Record)]
/// struct Sale {
///     region: String,
///     #[record(rename = "total")]
///     amount: f64,
///     #[record(with = "channel")]
///     channel: Channel,
///     #[record(skip)]
///     internal_id: u64,
/// }
///
/// let sales = vec![
///     Sale { region: "north".into(), amount: 5.0, channel: Channel::Web, internal_id: 1 },
///     Sale { region: "north".into(), amount: 2.5, channel: Channel::Store, internal_id: 2 },
/// ];
///
/// let groups = Aggro::new()
///     .filter_eq(Sale::CHANNEL, "web")
///     .group_by(Sale::REGION)
///     .sum(Sale::TOTAL)
///     .evaluate(&sales);
/// assert_eq!(groups[0].get("sum_total"), Some(&Value::from(5.0)));
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
