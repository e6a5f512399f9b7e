//! Parsing for `#[record(...)]` field attributes.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Expr, ExprLit, Lit, Meta, Path, Result, Token,
};

/// Field-level attributes from `#[record(...)]`.
#[derive(Debug, Clone)]
pub struct RecordAttr {
    /// Leave the field out of the record.
    pub skip: bool,
    /// Field name used by pipelines (default: the Rust field name).
    pub rename: Option<String>,
    /// Conversion function `fn(&T) -> aggro::Value` for types without
    /// `Into<Value>`.
    pub with: Option<Path>,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for RecordAttr {
    fn default() -> Self {
        RecordAttr {
            skip: false,
            rename: None,
            with: None,
            span: Span::call_site(),
        }
    }
}

fn string_literal(value: &Expr, what: &str) -> Result<(String, Span)> {
    match value {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok((s.value(), s.span())),
        other => Err(Error::new(
            other.span(),
            format!("{what} must be a string literal"),
        )),
    }
}

impl Parse for RecordAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = RecordAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("skip") => {
                    attr.skip = true;
                    attr.span = p.span();
                }

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    let (name, span) = string_literal(&nv.value, "rename")?;
                    if name.is_empty() {
                        return Err(Error::new(span, "rename must not be empty"));
                    }
                    attr.rename = Some(name);
                    attr.span = span;
                }

                Meta::NameValue(nv) if nv.path.is_ident("with") => {
                    let (path, span) = string_literal(&nv.value, "with")?;
                    let parsed: Path = syn::parse_str(&path).map_err(|_| {
                        Error::new(span, format!("with = \"{path}\" is not a function path"))
                    })?;
                    attr.with = Some(parsed);
                    attr.span = span;
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown record attribute. Expected: skip, rename = \"...\", or with = \"...\"",
                    ));
                }
            }
        }

        if attr.skip && (attr.rename.is_some() || attr.with.is_some()) {
            return Err(Error::new(
                attr.span,
                "skip cannot be combined with rename or with",
            ));
        }

        Ok(attr)
    }
}

/// Extract `#[record(...)]` attributes from a field's attributes.
pub fn parse_record_attrs(attrs: &[Attribute]) -> Result<RecordAttr> {
    for attr in attrs {
        if attr.path().is_ident("record") {
            return attr.parse_args::<RecordAttr>();
        }
    }
    Ok(RecordAttr::default())
}
