//! Implementation of the `#[derive(Record)]` macro.
//!
//! This macro generates an implementation of the `Record` trait and field
//! name constants for use with the pipeline builder.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Ident, Result};

use super::attrs::parse_record_attrs;

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut field_matches: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut constants: Vec<(String, String)> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_record_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }

        let record_name = attrs.rename.unwrap_or_else(|| field_name.unraw().to_string());
        if seen.contains(&record_name) {
            return Err(Error::new(
                field.span(),
                format!("duplicate record field name '{record_name}'"),
            ));
        }
        seen.push(record_name.clone());

        let const_name = constant_ident(&record_name, field.span())?;
        let const_str = const_name.to_string();
        if let Some((_, other)) = constants.iter().find(|(c, _)| *c == const_str) {
            return Err(Error::new(
                field.span(),
                format!(
                    "record names '{other}' and '{record_name}' both map to constant `{const_str}`"
                ),
            ));
        }
        constants.push((const_str, record_name.clone()));

        field_constants.push(quote! {
            /// Field name constant for pipeline builders.
            pub const #const_name: &'static str = #record_name;
        });

        let value_expr = match &attrs.with {
            Some(convert) => quote! { #convert(&self.#field_name) },
            None => quote! {
                ::aggro::Value::from(::core::clone::Clone::clone(&self.#field_name))
            },
        };

        field_matches.push(quote! {
            #record_name => #value_expr,
        });
    }

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::aggro::Record for #struct_name #ty_generics #where_clause {
            fn field(&self, name: &str) -> ::aggro::Value {
                match name {
                    #(#field_matches)*
                    _ => ::aggro::Value::Undefined,
                }
            }
        }
    };

    Ok(expanded)
}

/// Builds the constant identifier for a record name.
fn constant_ident(record_name: &str, span: Span) -> Result<Ident> {
    let name = to_screaming_snake_case(record_name);
    let mut ident: Ident = syn::parse_str(&name).map_err(|_| {
        Error::new(
            span,
            format!("record name '{record_name}' does not form a valid constant name `{name}`"),
        )
    })?;
    ident.set_span(span);
    Ok(ident)
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == '.' || c == ' ' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = c.is_alphanumeric();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(input: DeriveInput) -> Result<String> {
        record_derive_impl(input).map(|tokens| tokens.to_string())
    }

    #[test]
    fn test_screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("amount"), "AMOUNT");
        assert_eq!(to_screaming_snake_case("sold_at"), "SOLD_AT");
        assert_eq!(to_screaming_snake_case("soldAt"), "SOLD_AT");
        assert_eq!(to_screaming_snake_case("unit-price"), "UNIT_PRICE");
        assert_eq!(to_screaming_snake_case("geo.region"), "GEO_REGION");
    }

    #[test]
    fn test_expands_fields_and_constants() {
        let out = expand(syn::parse_quote! {
            struct Sale {
                region: String,
                #[record(rename = "total")]
                amount: i64,
                #[record(skip)]
                id: u64,
            }
        })
        .unwrap();

        assert!(out.contains("const REGION"));
        assert!(out.contains("const TOTAL"));
        assert!(out.contains("\"total\" =>"));
        assert!(!out.contains("\"id\""));
        assert!(out.contains(":: aggro :: Record for Sale"));
    }

    #[test]
    fn test_with_conversion() {
        let out = expand(syn::parse_quote! {
            struct Task {
                #[record(with = "status_value")]
                status: Status,
            }
        })
        .unwrap();
        assert!(out.contains("status_value (& self . status)"));
    }

    #[test]
    fn test_generics_forwarded() {
        let out = expand(syn::parse_quote! {
            struct Tagged<T: Clone> where T: Into<::aggro::Value> {
                tag: T,
            }
        })
        .unwrap();
        assert!(out.contains("Record for Tagged < T >"));
    }

    #[test]
    fn test_rejects_tuple_struct() {
        let err = expand(syn::parse_quote! { struct Pair(i64, i64); }).unwrap_err();
        assert!(err.to_string().contains("named fields"));
    }

    #[test]
    fn test_rejects_enum() {
        let err = expand(syn::parse_quote! { enum Kind { A, B } }).unwrap_err();
        assert!(err.to_string().contains("only be derived for structs"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let err = expand(syn::parse_quote! {
            struct Row {
                a: i64,
                #[record(rename = "a")]
                b: i64,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("duplicate record field name"));
    }

    #[test]
    fn test_rejects_invalid_constant_name() {
        let err = expand(syn::parse_quote! {
            struct Row {
                #[record(rename = "1st")]
                first: i64,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("valid constant name `1ST`"));

        let err = expand(syn::parse_quote! {
            struct Row {
                #[record(rename = "%")]
                share: f64,
            }
        })
        .unwrap_err();
        assert!(err.to_string().contains("valid constant name"));
    }

    #[test]
    fn test_raw_identifiers_are_unraw() {
        let out = expand(syn::parse_quote! {
            struct Row {
                r#type: String,
            }
        })
        .unwrap();
        assert!(out.contains("const TYPE"));
        assert!(out.contains("\"type\" =>"));
    }

    #[test]
    fn test_rejects_colliding_constants() {
        let err = expand(syn::parse_quote! {
            struct Row {
                #[record(rename = "a.b")]
                dotted: i64,
                a_b: i64,
            }
        })
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'a.b' and 'a_b' both map to constant `A_B`"));
    }
}
