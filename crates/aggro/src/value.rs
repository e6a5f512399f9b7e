//! Runtime value types flowing through the pipeline.
//!
//! The [`Value`] enum is what record accessors return, what filters compare
//! against, what group keys are made of, and what aggregates produce. Unlike a
//! schema-typed column, a `Value` can be absent ([`Value::Undefined`]), explicitly
//! null, or any of the scalar and container kinds below.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Add;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::{AggroError, Result};

/// Dynamic value read from a record or produced by an aggregate.
///
/// # Example
///
/// ```
/// use aggro::{Value, Number, Timestamp};
///
/// assert_eq!(Value::from(3), Value::Number(Number::I64(3)));
/// assert_eq!(Value::from("north"), Value::String("north".into()));
/// assert_eq!(Value::from(None::<i64>), Value::Null);
/// assert!(Value::from(Timestamp::from_secs(1)).is_date());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Field not present. Dropped before aggregation.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
    /// Date-like value. Normalizes to its millisecond timestamp.
    Date(Timestamp),
    /// Ordered list of values.
    List(Vec<Value>),
    /// String-keyed map of values.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns `true` if this is the `Undefined` value.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns `true` if this is the `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for `Null` and `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Returns `true` if this is a `Number` value.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns `true` if this is a `Date` value.
    pub fn is_date(&self) -> bool {
        matches!(self, Value::Date(_))
    }

    /// Returns `true` if this is a number that is not-a-number.
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    /// Extracts the number value, if present.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extracts the number value as `f64`, if present.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().map(Number::to_f64)
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extracts the timestamp of a `Date` value, if present.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Value::Date(t) => Some(*t),
            _ => None,
        }
    }

    /// Extracts the items of a `List` value, if present.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the display name of this value's kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    fn mismatch(&self, expected: &'static str) -> AggroError {
        AggroError::TypeMismatch {
            expected,
            actual: self.kind(),
        }
    }
}

/// Numeric value supporting all common numeric types.
///
/// Numbers are stored in one of three variants to preserve precision:
/// - `I64` for signed integers
/// - `U64` for unsigned integers
/// - `F64` for floating point
///
/// Equality and ordering are numeric across variants, so `I64(2)`, `U64(2)`
/// and `F64(2.0)` are all equal.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    /// Signed 64-bit integer.
    I64(i64),
    /// Unsigned 64-bit integer.
    U64(u64),
    /// 64-bit floating point.
    F64(f64),
}

impl Number {
    /// Not-a-number, the result of best-effort arithmetic on bad input.
    pub const NAN: Number = Number::F64(f64::NAN);

    /// Converts the number to f64 for comparison.
    pub fn to_f64(self) -> f64 {
        match self {
            Number::I64(n) => n as f64,
            Number::U64(n) => n as f64,
            Number::F64(n) => n,
        }
    }

    /// Returns `true` if this number is not-a-number.
    pub fn is_nan(self) -> bool {
        matches!(self, Number::F64(n) if n.is_nan())
    }

    /// Compares two numbers, handling mixed types.
    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::I64(a), Number::I64(b)) => Some(a.cmp(&b)),
            (Number::U64(a), Number::U64(b)) => Some(a.cmp(&b)),
            (Number::F64(a), Number::F64(b)) => a.partial_cmp(&b),
            (Number::I64(a), Number::U64(b)) => Some(i128::from(a).cmp(&i128::from(b))),
            (Number::U64(a), Number::I64(b)) => Some(i128::from(a).cmp(&i128::from(b))),

            // Mixed integer/float comparisons - convert to f64
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.compare(*other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(*other)
    }
}

/// Integer addition stays integral until it overflows, then continues in f64.
impl Add for Number {
    type Output = Number;

    fn add(self, other: Number) -> Number {
        let checked = match (self, other) {
            (Number::I64(a), Number::I64(b)) => a.checked_add(b).map(Number::I64),
            (Number::U64(a), Number::U64(b)) => a.checked_add(b).map(Number::U64),
            (Number::I64(a), Number::U64(b)) | (Number::U64(b), Number::I64(a)) => {
                i64::try_from(b)
                    .ok()
                    .and_then(|b| a.checked_add(b))
                    .map(Number::I64)
            }
            _ => None,
        };
        checked.unwrap_or_else(|| Number::F64(self.to_f64() + other.to_f64()))
    }
}

// Conversions from primitive types
impl From<i8> for Number {
    fn from(n: i8) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i16> for Number {
    fn from(n: i16) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::I64(n as i64)
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::I64(n)
    }
}

impl From<u8> for Number {
    fn from(n: u8) -> Self {
        Number::U64(n as u64)
    }
}

impl From<u16> for Number {
    fn from(n: u16) -> Self {
        Number::U64(n as u64)
    }
}

impl From<u32> for Number {
    fn from(n: u32) -> Self {
        Number::U64(n as u64)
    }
}

impl From<u64> for Number {
    fn from(n: u64) -> Self {
        Number::U64(n)
    }
}

impl From<f32> for Number {
    fn from(n: f32) -> Self {
        Number::F64(n as f64)
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::F64(n)
    }
}

impl From<usize> for Number {
    fn from(n: usize) -> Self {
        Number::U64(n as u64)
    }
}

impl From<isize> for Number {
    fn from(n: isize) -> Self {
        Number::I64(n as i64)
    }
}

/// Timestamp value represented as milliseconds since Unix epoch.
///
/// This is the date-like value of the engine: it groups, filters and sorts by
/// its instant, while group keys keep the `Date` form for downstream use.
///
/// # Example
///
/// ```
/// use aggro::Timestamp;
///
/// let ts = Timestamp(1706500000000); // 2024-01-29 approx
/// assert!(Timestamp(1000) < Timestamp(2000));
/// assert_eq!(ts.as_secs(), 1706500000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a new timestamp from milliseconds since Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    /// Creates a new timestamp from seconds since Unix epoch.
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs * 1000)
    }

    /// Returns the timestamp as milliseconds since Unix epoch.
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch.
    pub fn as_secs(self) -> i64 {
        self.0 / 1000
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Timestamp(millis)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => Timestamp(elapsed.as_millis() as i64),
            Err(before) => Timestamp(-(before.duration().as_millis() as i64)),
        }
    }
}

// Conversions into Value

macro_rules! value_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

value_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Timestamp> for Value {
    fn from(t: Timestamp) -> Self {
        Value::Date(t)
    }
}

impl From<SystemTime> for Value {
    fn from(time: SystemTime) -> Self {
        Value::Date(Timestamp::from(time))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(json_number(&n)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(json_number(n)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

fn json_number(n: &serde_json::Number) -> Number {
    if let Some(i) = n.as_i64() {
        Number::I64(i)
    } else if let Some(u) = n.as_u64() {
        Number::U64(u)
    } else {
        Number::F64(n.as_f64().unwrap_or(f64::NAN))
    }
}

// Conversions out of Value

impl TryFrom<Value> for Number {
    type Error = AggroError;

    fn try_from(value: Value) -> Result<Self> {
        value.as_number().ok_or_else(|| value.mismatch("number"))
    }
}

impl TryFrom<Value> for f64 {
    type Error = AggroError;

    fn try_from(value: Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| value.mismatch("number"))
    }
}

impl TryFrom<Value> for Timestamp {
    type Error = AggroError;

    fn try_from(value: Value) -> Result<Self> {
        value.as_timestamp().ok_or_else(|| value.mismatch("date"))
    }
}

impl TryFrom<Value> for String {
    type Error = AggroError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }
}

impl TryFrom<Value> for Vec<Value> {
    type Error = AggroError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(other.mismatch("list")),
        }
    }
}

// Serialization

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            Number::I64(n) => serializer.serialize_i64(n),
            Number::U64(n) => serializer.serialize_u64(n),
            Number::F64(n) => serializer.serialize_f64(n),
        }
    }
}

/// `Undefined` serializes as `null`; `Date` as its millisecond timestamp.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(t) => serializer.serialize_i64(t.as_millis()),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_type_checks() {
        assert!(Value::Undefined.is_undefined());
        assert!(Value::Null.is_null());
        assert!(Value::Null.is_nullish());
        assert!(Value::Undefined.is_nullish());
        assert!(!Value::from(0).is_nullish());
        assert!(Value::from(1.5).is_number());
        assert!(Value::Date(Timestamp(0)).is_date());
        assert!(Value::Number(Number::NAN).is_nan());
    }

    #[test]
    fn value_extractors() {
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(Value::from(42).as_number(), Some(Number::I64(42)));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(
            Value::Date(Timestamp(1000)).as_timestamp(),
            Some(Timestamp(1000))
        );

        // Wrong type returns None
        assert_eq!(Value::from("test").as_number(), None);
        assert_eq!(Value::from(1).as_str(), None);
        assert_eq!(Value::Date(Timestamp(5)).as_f64(), None);
    }

    #[test]
    fn number_equality_is_numeric() {
        assert_eq!(Number::I64(2), Number::U64(2));
        assert_eq!(Number::I64(2), Number::F64(2.0));
        assert_ne!(Number::NAN, Number::NAN);
        assert_eq!(Value::from(2u64), Value::from(2));
    }

    #[test]
    fn number_comparisons_mixed_types() {
        assert_eq!(
            Number::I64(-1).compare(Number::U64(u64::MAX)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Number::U64(10).compare(Number::F64(5.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Number::F64(f64::NAN).compare(Number::F64(1.0)), None);
    }

    #[test]
    fn number_addition() {
        assert!(matches!(Number::I64(2) + Number::I64(3), Number::I64(5)));
        assert!(matches!(Number::I64(-2) + Number::U64(3), Number::I64(1)));
        let overflow = Number::I64(i64::MAX) + Number::I64(1);
        assert!(matches!(overflow, Number::F64(_)));
        assert_eq!(Number::I64(1) + Number::F64(0.5), Number::F64(1.5));
        assert!((Number::NAN + Number::I64(1)).is_nan());
    }

    #[test]
    fn option_and_vec_conversions() {
        assert_eq!(Value::from(Some(3)), Value::from(3));
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::List(vec![Value::from(1), Value::from(2)])
        );
    }

    #[test]
    fn json_conversion() {
        let value = Value::from(json!({"a": [1, "x", null], "b": 1.5, "c": true}));
        let Value::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(
            map["a"],
            Value::List(vec![Value::from(1), Value::from("x"), Value::Null])
        );
        assert_eq!(map["b"], Value::from(1.5));
        assert_eq!(map["c"], Value::from(true));
    }

    #[test]
    fn try_from_value() {
        assert_eq!(Number::try_from(Value::from(4)).unwrap(), Number::I64(4));
        assert_eq!(f64::try_from(Value::from(4)).unwrap(), 4.0);
        assert_eq!(
            Timestamp::try_from(Value::Date(Timestamp(9))).unwrap(),
            Timestamp(9)
        );
        assert_eq!(String::try_from(Value::from("s")).unwrap(), "s");

        let err = Number::try_from(Value::from("s")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch: expected number, got string"
        );
    }

    #[test]
    fn serializes_like_json() {
        let value = Value::List(vec![
            Value::Undefined,
            Value::Date(Timestamp(1500)),
            Value::from(2),
            Value::from("x"),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!([null, 1500, 2, "x"])
        );
    }

    #[test]
    fn timestamp_conversions() {
        assert_eq!(Timestamp::from_secs(1).as_millis(), 1000);
        assert_eq!(Timestamp::from_millis(5000).as_secs(), 5);
        assert_eq!(Timestamp::from(UNIX_EPOCH), Timestamp(0));
        let later = UNIX_EPOCH + std::time::Duration::from_millis(2500);
        assert_eq!(Timestamp::from(later), Timestamp(2500));
    }
}
