//! Filter specs.
//!
//! A [`FilterSpec`] is a single acceptance rule: a whole-record predicate, a
//! field test function, an equality, a range bound, or a set membership. The
//! builder holds them in registration order and a record passes only if every
//! spec accepts it.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::normalize::{normalize, KeyIdentity};
use crate::op::FilterOp;
use crate::ordering::compare_values;
use crate::value::Value;

/// Whole-record predicate.
pub type Predicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

/// Field test, called with the normalized and the raw field value.
pub type FieldTest = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// A single registered filter.
///
/// # Example
///
/// ```
/// use aggro::{FilterOp, FilterSpec, Value};
/// use std::collections::HashMap;
///
/// type Row = HashMap<String, Value>;
///
/// let spec: FilterSpec<Row> = FilterSpec::gt("price", 10);
/// assert_eq!(spec.field(), Some("price"));
/// assert_eq!(spec.op(), FilterOp::Gt);
/// ```
pub struct FilterSpec<R> {
    op: FilterOp,
    condition: Condition<R>,
}

enum Condition<R> {
    Record(Predicate<R>),
    Test {
        field: String,
        test: FieldTest,
    },
    Equals {
        field: String,
        value: Value,
        identity: KeyIdentity,
    },
    Bound {
        field: String,
        value: Value,
    },
    Set {
        field: String,
        set: ValueSet,
    },
}

impl<R> FilterSpec<R> {
    /// Whole-record predicate filter.
    pub fn predicate(predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        FilterSpec {
            op: FilterOp::Eq,
            condition: Condition::Record(Arc::new(predicate)),
        }
    }

    /// Field test filter. The test receives the normalized then the raw value.
    pub fn test(
        field: impl Into<String>,
        test: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        FilterSpec {
            op: FilterOp::Eq,
            condition: Condition::Test {
                field: field.into(),
                test: Arc::new(test),
            },
        }
    }

    /// Equality filter against the normalized `value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = normalize(&value.into());
        FilterSpec {
            op: FilterOp::Eq,
            condition: Condition::Equals {
                field: field.into(),
                identity: KeyIdentity::of(&value),
                value,
            },
        }
    }

    /// Greater-than-or-equal bound.
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::bound(FilterOp::Gte, field, value)
    }

    /// Less-than-or-equal bound.
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::bound(FilterOp::Lte, field, value)
    }

    /// Strict greater-than bound.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::bound(FilterOp::Gt, field, value)
    }

    /// Strict less-than bound.
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::bound(FilterOp::Lt, field, value)
    }

    fn bound(op: FilterOp, field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterSpec {
            op,
            condition: Condition::Bound {
                field: field.into(),
                value: normalize(&value.into()),
            },
        }
    }

    /// Set membership filter.
    ///
    /// `Undefined` inputs are dropped and duplicates collapse. Returns `None`
    /// when nothing usable is left: an empty set is no constraint, not a
    /// filter that rejects everything.
    pub fn is_in<I>(field: impl Into<String>, values: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let set = ValueSet::new(values.into_iter().map(Into::into));
        if set.is_empty() {
            return None;
        }
        Some(FilterSpec {
            op: FilterOp::In,
            condition: Condition::Set {
                field: field.into(),
                set,
            },
        })
    }

    /// Returns the operator.
    pub fn op(&self) -> FilterOp {
        self.op
    }

    /// Returns the field this spec reads, or `None` for record predicates.
    pub fn field(&self) -> Option<&str> {
        match &self.condition {
            Condition::Record(_) => None,
            Condition::Test { field, .. }
            | Condition::Equals { field, .. }
            | Condition::Bound { field, .. }
            | Condition::Set { field, .. } => Some(field),
        }
    }

    /// Returns the normalized comparison value of equality and range specs.
    pub fn value(&self) -> Option<&Value> {
        match &self.condition {
            Condition::Equals { value, .. } | Condition::Bound { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the normalized members of a set spec.
    pub fn values(&self) -> Option<&[Value]> {
        match &self.condition {
            Condition::Set { set, .. } => Some(set.values()),
            _ => None,
        }
    }

    /// Tests a record against this spec.
    ///
    /// The accessor extracts field values from the record.
    pub fn accepts<F>(&self, record: &R, accessor: &F) -> bool
    where
        F: Fn(&R, &str) -> Value,
    {
        match &self.condition {
            Condition::Record(predicate) => predicate(record),
            Condition::Test { field, test } => {
                let raw = accessor(record, field);
                test(&normalize(&raw), &raw)
            }
            Condition::Equals {
                field, identity, ..
            } => !identity.is_nan() && KeyIdentity::of(&accessor(record, field)) == *identity,
            Condition::Bound { field, value } => {
                match compare_values(&accessor(record, field), value) {
                    Some(ordering) => self.op.eval_ordering(ordering),
                    None => false, // incomparable
                }
            }
            Condition::Set { field, set } => set.contains(&accessor(record, field)),
        }
    }
}

impl<R> Clone for FilterSpec<R> {
    fn clone(&self) -> Self {
        let condition = match &self.condition {
            Condition::Record(predicate) => Condition::Record(Arc::clone(predicate)),
            Condition::Test { field, test } => Condition::Test {
                field: field.clone(),
                test: Arc::clone(test),
            },
            Condition::Equals {
                field,
                value,
                identity,
            } => Condition::Equals {
                field: field.clone(),
                value: value.clone(),
                identity: identity.clone(),
            },
            Condition::Bound { field, value } => Condition::Bound {
                field: field.clone(),
                value: value.clone(),
            },
            Condition::Set { field, set } => Condition::Set {
                field: field.clone(),
                set: set.clone(),
            },
        };
        FilterSpec {
            op: self.op,
            condition,
        }
    }
}

impl<R> fmt::Debug for FilterSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("FilterSpec");
        s.field("op", &self.op).field("field", &self.field());
        match &self.condition {
            Condition::Record(_) | Condition::Test { .. } => s.field("test", &"<fn>"),
            Condition::Equals { value, .. } | Condition::Bound { value, .. } => {
                s.field("value", value)
            }
            Condition::Set { set, .. } => s.field("value", &set.values()),
        };
        s.finish()
    }
}

/// Normalized, deduplicated set of values for `in` filters.
#[derive(Debug, Clone)]
pub struct ValueSet {
    values: Vec<Value>,
    index: HashSet<KeyIdentity>,
}

impl ValueSet {
    /// Builds a set, dropping `Undefined` and keeping first occurrences.
    ///
    /// Every `NaN` is kept as its own member and never matches.
    pub fn new(values: impl IntoIterator<Item = Value>) -> Self {
        let mut set = ValueSet {
            values: Vec::new(),
            index: HashSet::new(),
        };
        for value in values.into_iter().filter(|v| !v.is_undefined()) {
            let value = normalize(&value);
            let identity = KeyIdentity::of(&value);
            if identity.is_nan() || set.index.insert(identity) {
                set.values.push(value);
            }
        }
        set
    }

    /// Returns `true` if the normalized `value` is a member.
    pub fn contains(&self, value: &Value) -> bool {
        let identity = KeyIdentity::of(value);
        if identity.is_nan() {
            return false;
        }
        match self.values.as_slice() {
            [only] => KeyIdentity::of(only) == identity,
            _ => self.index.contains(&identity),
        }
    }

    /// Returns the normalized members in first-occurrence order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Argument of a `between` filter.
///
/// A scalar means equality; a list is interpreted by its length (see
/// [`Aggro::between`](crate::Aggro::between)).
#[derive(Debug, Clone, PartialEq)]
pub enum Between {
    /// A single value.
    Scalar(Value),
    /// A list of bounds or candidate values.
    List(Vec<Value>),
}

impl From<Value> for Between {
    fn from(value: Value) -> Self {
        Between::Scalar(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Between {
    fn from(items: Vec<T>) -> Self {
        Between::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Between {
    fn from(items: [T; N]) -> Self {
        Between::List(items.into_iter().map(Into::into).collect())
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Between {
    fn from((start, end): (A, B)) -> Self {
        Between::List(vec![start.into(), end.into()])
    }
}
