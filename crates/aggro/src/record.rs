//! Field access on input records.
//!
//! The engine never looks inside a record except through a field accessor.
//! Implement [`Record`] (or derive it with `#[derive(Record)]` under the
//! `derive` feature), or pass an accessor function to
//! [`Aggro::evaluate_with`](crate::Aggro::evaluate_with).

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::value::Value;

/// Trait for types that can be filtered, grouped and aggregated.
///
/// # Derive Usage
///
/// ```ignore
/// use aggro::{Aggro, Record};
///
/// #[derive(Record)]
/// struct Sale {
///     region: String,
///     amount: i64,
///     #[record(skip)]
///     internal_id: u64,
/// }
///
/// let sales = vec![
///     Sale { region: "north".into(), amount: 5, internal_id: 1 },
///     Sale { region: "south".into(), amount: 3, internal_id: 2 },
/// ];
/// let groups = Aggro::new().group_by(Sale::REGION).sum(Sale::AMOUNT).evaluate(&sales);
/// ```
///
/// # Manual Implementation
///
/// ```
/// use aggro::{Record, Value};
///
/// struct Sale {
///     region: String,
///     amount: i64,
/// }
///
/// impl Record for Sale {
///     fn field(&self, name: &str) -> Value {
///         match name {
///             "region" => Value::from(&self.region),
///             "amount" => Value::from(self.amount),
///             _ => Value::Undefined,
///         }
///     }
/// }
/// ```
pub trait Record {
    /// Returns the value of a field, or [`Value::Undefined`] if the record
    /// has no such field.
    fn field(&self, name: &str) -> Value;

    /// Returns an accessor function suitable for
    /// [`Aggro::evaluate_with`](crate::Aggro::evaluate_with).
    fn accessor(item: &Self, name: &str) -> Value
    where
        Self: Sized,
    {
        item.field(name)
    }
}

impl<T: Record + ?Sized> Record for &T {
    fn field(&self, name: &str) -> Value {
        (**self).field(name)
    }
}

impl<S: BuildHasher> Record for HashMap<String, Value, S> {
    fn field(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }
}

impl Record for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }
}

/// A `Map` value is a record; every other value has no fields.
impl Record for Value {
    fn field(&self, name: &str) -> Value {
        match self {
            Value::Map(entries) => entries.get(name).cloned().unwrap_or_default(),
            _ => Value::Undefined,
        }
    }
}

impl Record for serde_json::Map<String, serde_json::Value> {
    fn field(&self, name: &str) -> Value {
        self.get(name).map(Value::from).unwrap_or_default()
    }
}

/// JSON objects are records; non-object JSON values have no fields.
impl Record for serde_json::Value {
    fn field(&self, name: &str) -> Value {
        match self {
            serde_json::Value::Object(map) => map.field(name),
            _ => Value::Undefined,
        }
    }
}
