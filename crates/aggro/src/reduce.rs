//! Reducers and aggregate specs.
//!
//! A reducer turns the ordered field values of a group (with `Undefined`
//! entries already dropped) into one [`Value`]. The built-in reducers follow a
//! best-effort numeric policy: `sum` and `mean` treat `Null` as `0` and
//! booleans as `0`/`1`, and any other non-number turns the result into `NaN`
//! rather than an error.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::ops::Add;
use std::sync::Arc;

use crate::normalize::KeyIdentity;
use crate::ordering::compare_values;
use crate::value::{Number, Value};

/// Custom reducer over a group's field values.
pub type ReduceFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Post-processing step applied to a reducer's result.
pub type PostFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Reducer identity.
///
/// Each reducer owns its default result-name convention; see
/// [`Reducer::default_name`].
#[derive(Clone)]
pub enum Reducer {
    Sum,
    Mean,
    Min,
    Max,
    Range,
    Uniq,
    Count,
    One,
    Custom(ReduceFn),
}

impl Reducer {
    /// Returns the mnemonic used as result-name prefix.
    ///
    /// `One` has no prefix: its result is named after the bare field.
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            Reducer::Sum => Some("sum"),
            Reducer::Mean => Some("mean"),
            Reducer::Min => Some("min"),
            Reducer::Max => Some("max"),
            Reducer::Range => Some("range"),
            Reducer::Uniq => Some("uniq"),
            Reducer::Count => Some("count"),
            Reducer::One => None,
            Reducer::Custom(_) => Some("aggr"),
        }
    }

    /// Default result name for an aggregate over `field`.
    ///
    /// ```
    /// use aggro::Reducer;
    ///
    /// assert_eq!(Reducer::Sum.default_name("price"), "sum_price");
    /// assert_eq!(Reducer::One.default_name("price"), "price");
    /// ```
    pub fn default_name(&self, field: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{prefix}_{field}"),
            None => field.to_string(),
        }
    }

    /// Applies the reducer.
    pub fn reduce(&self, values: &[Value]) -> Value {
        match self {
            Reducer::Sum => sum(values),
            Reducer::Mean => mean(values),
            Reducer::Min => min(values),
            Reducer::Max => max(values),
            Reducer::Range => range(values),
            Reducer::Uniq => Value::List(uniq(values)),
            Reducer::Count => Value::Number(Number::from(count(values))),
            Reducer::One => values.first().cloned().unwrap_or_default(),
            Reducer::Custom(f) => f(values),
        }
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reducer::Custom(_) => f.write_str("Custom(<fn>)"),
            other => f.write_str(other.prefix().unwrap_or("one")),
        }
    }
}

/// A registered aggregate: source field, reducer, result name, and an
/// optional post-processing step.
///
/// # Example
///
/// ```
/// use aggro::{AggregateSpec, Value};
///
/// let spec = AggregateSpec::sum("cents")
///     .map(|v| Value::from(v.as_f64().unwrap_or(0.0) / 100.0))
///     .named("dollars");
/// assert_eq!(spec.name(), "dollars");
/// assert_eq!(spec.apply(&[Value::from(150), Value::from(50)]), Value::from(2.0));
/// ```
#[derive(Clone)]
pub struct AggregateSpec {
    field: String,
    name: String,
    reducer: Reducer,
    post: Option<PostFn>,
}

impl AggregateSpec {
    /// Creates a spec named by the reducer's convention.
    pub fn new(field: impl Into<String>, reducer: Reducer) -> Self {
        let field = field.into();
        AggregateSpec {
            name: reducer.default_name(&field),
            field,
            reducer,
            post: None,
        }
    }

    /// Creates a spec with a custom reducer, named `aggr_<field>`.
    pub fn custom(
        field: impl Into<String>,
        reducer: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::new(field, Reducer::Custom(Arc::new(reducer)))
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::new(field, Reducer::Sum)
    }

    pub fn mean(field: impl Into<String>) -> Self {
        Self::new(field, Reducer::Mean)
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::new(field, Reducer::Min)
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::new(field, Reducer::Max)
    }

    pub fn range(field: impl Into<String>) -> Self {
        Self::new(field, Reducer::Range)
    }

    pub fn uniq(field: impl Into<String>) -> Self {
        Self::new(field, Reducer::Uniq)
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::new(field, Reducer::Count)
    }

    pub fn one(field: impl Into<String>) -> Self {
        Self::new(field, Reducer::One)
    }

    /// Overrides the result name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the post-processing step applied to the reducer's result.
    pub fn map(mut self, post: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.post = Some(Arc::new(post));
        self
    }

    /// Returns the source field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the result name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the reducer.
    pub fn reducer(&self) -> &Reducer {
        &self.reducer
    }

    /// Returns `true` if a post-processing step is set.
    pub fn has_post(&self) -> bool {
        self.post.is_some()
    }

    /// Reduces `values` and applies the post-processing step, if any.
    pub fn apply(&self, values: &[Value]) -> Value {
        let result = self.reducer.reduce(values);
        match &self.post {
            Some(post) => post(result),
            None => result,
        }
    }
}

impl fmt::Debug for AggregateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateSpec")
            .field("field", &self.field)
            .field("name", &self.name)
            .field("reducer", &self.reducer)
            .field("post", &self.post.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

fn numeric(value: &Value) -> Number {
    match value {
        Value::Number(n) => *n,
        Value::Null => Number::I64(0),
        Value::Bool(b) => Number::I64(i64::from(*b)),
        _ => Number::NAN,
    }
}

/// Arithmetic sum; `0` for empty input.
pub fn sum(values: &[Value]) -> Value {
    Value::Number(total(values))
}

/// Arithmetic mean; `NaN` for empty input.
pub fn mean(values: &[Value]) -> Value {
    Value::Number(Number::F64(total(values).to_f64() / values.len() as f64))
}

fn total(values: &[Value]) -> Number {
    values.iter().map(numeric).fold(Number::I64(0), Add::add)
}

/// Smallest value by [`compare_values`], with `Null` compared as `0`;
/// `Undefined` for empty input.
///
/// Values that cannot be compared to the current minimum never replace it.
pub fn min(values: &[Value]) -> Value {
    extent(values).0.cloned().unwrap_or_default()
}

/// Largest value by [`compare_values`]; `Undefined` for empty input.
pub fn max(values: &[Value]) -> Value {
    extent(values).1.cloned().unwrap_or_default()
}

/// `[min, max]` in one scan; `[Undefined, Undefined]` for empty input.
pub fn range(values: &[Value]) -> Value {
    let (lo, hi) = extent(values);
    Value::List(vec![
        lo.cloned().unwrap_or_default(),
        hi.cloned().unwrap_or_default(),
    ])
}

/// Smallest and largest values in one linear scan.
///
/// `Null` orders as `0` against numbers and dates, and the raw `Null` is
/// what gets returned when it wins.
pub fn extent<'v, I>(values: I) -> (Option<&'v Value>, Option<&'v Value>)
where
    I: IntoIterator<Item = &'v Value>,
{
    let mut lo: Option<&Value> = None;
    let mut hi: Option<&Value> = None;
    for value in values {
        if lo.is_none_or(|m| extreme_order(value, m).is_some_and(|o| o.is_lt())) {
            lo = Some(value);
        }
        if hi.is_none_or(|m| extreme_order(value, m).is_some_and(|o| o.is_gt())) {
            hi = Some(value);
        }
    }
    (lo, hi)
}

fn extreme_order(a: &Value, b: &Value) -> Option<Ordering> {
    let zero = Value::Number(Number::I64(0));
    let a = if a.is_null() { &zero } else { a };
    let b = if b.is_null() { &zero } else { b };
    compare_values(a, b)
}

/// First-occurrence deduplication by normalized identity.
///
/// A `NaN` never equals an earlier value, so each one is kept.
pub fn uniq(values: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| first_sighting(&mut seen, KeyIdentity::of(v)))
        .cloned()
        .collect()
}

/// Number of distinct normalized values, counting every `NaN`.
pub fn count(values: &[Value]) -> usize {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| first_sighting(&mut seen, KeyIdentity::of(v)))
        .count()
}

fn first_sighting(seen: &mut HashSet<KeyIdentity>, identity: KeyIdentity) -> bool {
    identity.is_nan() || seen.insert(identity)
}
