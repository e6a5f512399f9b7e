//! Implementation of the `#[derive(Record)]` macro.
//!
//! Generates a field accessor and field name constants from a struct's
//! named fields.

mod attrs;
mod derive;

pub use derive::record_derive_impl;
