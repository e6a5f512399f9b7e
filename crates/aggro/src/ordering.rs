//! Value comparison and group-key ordering.
//!
//! [`compare_values`] is the engine's `<`/`>`: it drives range filters,
//! `min`/`max`/`range` reducers and the default key comparator [`collate`].
//! [`KeyOrder`] is what `sort_keys` installs on a builder.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::normalize::normalize;
use crate::value::Value;

/// Custom comparator over normalized group keys.
///
/// `None` means the operands are incomparable.
pub type Comparator = Arc<dyn Fn(&Value, &Value) -> Option<Ordering> + Send + Sync>;

/// Compares two values after normalizing them.
///
/// Numbers compare numerically, strings lexicographically and booleans with
/// `false < true`. Returns `None` for any other pairing: mixed kinds, `Null`,
/// `Undefined`, lists, maps, and `NaN`.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (normalize(a), normalize(b)) {
        (Value::Number(a), Value::Number(b)) => a.compare(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(&b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(&b)),
        _ => None,
    }
}

/// Default three-way key comparator.
///
/// `Less`, `Greater` or `Equal` for comparable keys; `None` (the
/// not-a-number sentinel) when the keys cannot be ordered against each other.
pub fn collate(a: &Value, b: &Value) -> Option<Ordering> {
    compare_values(a, b)
}

/// Ordering applied to the top-level group keys.
#[derive(Clone)]
pub enum KeyOrder {
    /// The default [`collate`] comparator.
    Collate,
    /// A caller-supplied comparator.
    By(Comparator),
}

impl KeyOrder {
    /// Compares two raw group keys.
    ///
    /// Both keys are normalized before the comparator sees them. When the
    /// comparator reports them incomparable, a fixed total order takes over
    /// so the sort stays well defined.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let (a, b) = (normalize(a), normalize(b));
        let ordering = match self {
            KeyOrder::Collate => collate(&a, &b),
            KeyOrder::By(cmp) => cmp(&a, &b),
        };
        ordering.unwrap_or_else(|| fallback_order(&a, &b))
    }
}

impl fmt::Debug for KeyOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyOrder::Collate => f.write_str("Collate"),
            KeyOrder::By(_) => f.write_str("By(<fn>)"),
        }
    }
}

/// Total order over normalized values used when a comparator gives up.
///
/// Kinds are ranked, numbers fall back to `f64::total_cmp`, and values of any
/// other kind rank equal to their own kind.
fn fallback_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.to_f64().total_cmp(&y.to_f64()),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) | Value::Date(_) => 1,
        Value::String(_) => 2,
        Value::List(_) => 3,
        Value::Map(_) => 4,
        Value::Null => 5,
        Value::Undefined => 6,
    }
}
