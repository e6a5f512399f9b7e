//! Value normalization and identity.
//!
//! Before any equality test, range comparison, set lookup, bucket assignment
//! or sort, values go through [`normalize`]: date-like values collapse to
//! their millisecond timestamp so that two distinct `Date` values naming the
//! same instant behave as one. [`KeyIdentity`] is the hashable form of a
//! normalized value used by `is_in` filters, `uniq`/`count` reducers and the
//! partitioner.

use std::collections::BTreeMap;

use crate::value::{Number, Value};

/// Converts a value to its primitive comparable form.
///
/// `Date` values become their millisecond timestamp; everything else,
/// including `Null` and `Undefined`, is returned unchanged.
///
/// ```
/// use aggro::{normalize, Timestamp, Value};
///
/// assert_eq!(normalize(&Value::Date(Timestamp(1500))), Value::from(1500));
/// assert_eq!(normalize(&Value::from("x")), Value::from("x"));
/// assert_eq!(normalize(&Value::Undefined), Value::Undefined);
/// ```
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Date(ts) => Value::Number(Number::I64(ts.as_millis())),
        other => other.clone(),
    }
}

/// Hashable identity of a normalized value.
///
/// Numerically equal numbers share an identity whatever their
/// representation, `-0.0` equals `0`, and every `NaN` shares one identity.
/// Lists and maps compare structurally.
///
/// The shared `NaN` identity only serves group buckets. Equality filters,
/// set membership, `uniq` and `count` treat a `NaN` as matching nothing,
/// itself included; check [`KeyIdentity::is_nan`] before comparing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyIdentity {
    Undefined,
    Null,
    Bool(bool),
    /// Any number with an exact integral value.
    Int(i128),
    /// Non-integral finite or infinite float, by bit pattern.
    Float(u64),
    Nan,
    Str(String),
    List(Vec<KeyIdentity>),
    Map(BTreeMap<String, KeyIdentity>),
}

impl KeyIdentity {
    /// Returns `true` for the identity of a `NaN`.
    pub fn is_nan(&self) -> bool {
        matches!(self, KeyIdentity::Nan)
    }

    /// Computes the identity of a value, normalizing it first.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Undefined => KeyIdentity::Undefined,
            Value::Null => KeyIdentity::Null,
            Value::Bool(b) => KeyIdentity::Bool(*b),
            Value::Number(n) => Self::of_number(*n),
            Value::String(s) => KeyIdentity::Str(s.clone()),
            Value::Date(ts) => KeyIdentity::Int(i128::from(ts.as_millis())),
            Value::List(items) => KeyIdentity::List(items.iter().map(Self::of).collect()),
            Value::Map(entries) => KeyIdentity::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::of(v)))
                    .collect(),
            ),
        }
    }

    fn of_number(n: Number) -> Self {
        match n {
            Number::I64(i) => KeyIdentity::Int(i128::from(i)),
            Number::U64(u) => KeyIdentity::Int(i128::from(u)),
            Number::F64(f) if f.is_nan() => KeyIdentity::Nan,
            // 2^127 bounds the exact integral range of i128
            Number::F64(f) if f.fract() == 0.0 && f.abs() < 1.7e38 => KeyIdentity::Int(f as i128),
            Number::F64(f) => KeyIdentity::Float(f.to_bits()),
        }
    }
}
