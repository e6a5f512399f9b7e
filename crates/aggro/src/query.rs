//! Pipeline builder and executor.
//!
//! The [`Aggro`] struct provides a fluent builder API for declaring filters,
//! group keys, aggregates and key ordering, and methods for running the
//! pipeline against a slice of records.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::Result;
use crate::filter::{Between, FilterSpec};
use crate::group::{partition, Group, GroupKey, GroupKeys};
use crate::ordering::KeyOrder;
use crate::record::Record;
use crate::reduce::{extent, AggregateSpec};
use crate::value::Value;

/// A declarative filter / group-by / aggregate pipeline.
///
/// Running the pipeline goes through four fixed stages:
/// ```text
/// records -> filters (all must accept)
///         -> partition by each group key in turn, aggregating every group
///         -> sort top-level groups by key (if requested)
/// ```
///
/// Registration methods consume and return the builder. Evaluation borrows
/// it, so one builder can run any number of times, from any number of
/// threads, and always produces a fresh result.
///
/// # Example
///
/// ```
/// use aggro::{Aggro, Value};
/// use serde_json::json;
///
/// let rows = vec![
///     json!({"a": "x", "v": 1}),
///     json!({"a": "x", "v": 3}),
///     json!({"a": "y", "v": 2}),
/// ];
///
/// let groups = Aggro::new().group_by("a").sum("v").evaluate(&rows);
///
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].key, Value::from("x"));
/// assert_eq!(groups[0].get("sum_v"), Some(&Value::from(4)));
/// assert_eq!(groups[1].get("sum_v"), Some(&Value::from(2)));
/// ```
pub struct Aggro<R> {
    filters: Vec<FilterSpec<R>>,
    aggregates: Vec<AggregateSpec>,
    keys: Vec<GroupKey<R>>,
    order: Option<KeyOrder>,
}

impl<R> Aggro<R> {
    /// Creates an empty pipeline.
    ///
    /// An empty pipeline returns one ungrouped group holding every record.
    pub fn new() -> Self {
        Aggro {
            filters: Vec::new(),
            aggregates: Vec::new(),
            keys: Vec::new(),
            order: None,
        }
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Adds a whole-record predicate.
    pub fn filter(self, predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        self.filter_spec(FilterSpec::predicate(predicate))
    }

    /// Adds an equality filter against the normalized `value`.
    ///
    /// An `Undefined` value registers nothing.
    pub fn filter_eq(self, field: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if value.is_undefined() {
            warn!(field, "filter_eq called without a value; no filter created");
            return self;
        }
        self.filter_spec(FilterSpec::eq(field, value))
    }

    /// Adds a field test. The test receives the normalized and the raw value.
    pub fn filter_by(
        self,
        field: &str,
        test: impl Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter_spec(FilterSpec::test(field, test))
    }

    /// Adds a pre-built filter spec as is.
    pub fn filter_spec(mut self, spec: FilterSpec<R>) -> Self {
        self.filters.push(spec);
        self
    }

    /// Adds a filter accepting string fields that match `pattern`.
    ///
    /// Returns an error if the pattern is invalid.
    pub fn filter_regex(self, field: &str, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        Ok(self.filter_by(field, move |value, _| {
            value.as_str().is_some_and(|s| regex.is_match(s))
        }))
    }

    /// Adds a set-membership filter.
    ///
    /// `Undefined` entries are dropped and duplicates collapse; if nothing is
    /// left, no filter is registered.
    pub fn is_in<I>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        match FilterSpec::is_in(field, values) {
            Some(spec) => self.filter_spec(spec),
            None => self,
        }
    }

    /// Adds a range filter.
    ///
    /// - a scalar, or a one-element list, filters on equality;
    /// - `[start, end]` adds `>= start` and `<= end`, skipping a `Null` or
    ///   `Undefined` bound;
    /// - a longer list is reduced to `[min, max]` of its non-null members;
    /// - an empty list adds nothing.
    ///
    /// ```
    /// use aggro::{Aggro, Value};
    /// use serde_json::json;
    ///
    /// let rows: Vec<_> = (1..=5).map(|v| json!({ "v": v })).collect();
    ///
    /// let open_start = Aggro::new().between("v", (Value::Null, 2)).evaluate(&rows);
    /// assert_eq!(open_start[0].len(), 2);
    ///
    /// let spread = Aggro::new().between("v", [4, 2, 3]).evaluate(&rows);
    /// assert_eq!(spread[0].len(), 3);
    /// ```
    pub fn between(self, field: &str, range: impl Into<Between>) -> Self {
        match range.into() {
            Between::Scalar(value) => self.filter_eq(field, value),
            Between::List(mut list) => match list.len() {
                0 => self,
                1 => self.filter_eq(field, list.remove(0)),
                2 => {
                    let end = list.pop().unwrap_or_default();
                    let start = list.pop().unwrap_or_default();
                    self.bounded(field, start, end)
                }
                _ => {
                    let (lo, hi) = extent(list.iter().filter(|v| !v.is_nullish()));
                    let (start, end) = (lo.cloned(), hi.cloned());
                    self.bounded(field, start.unwrap_or_default(), end.unwrap_or_default())
                }
            },
        }
    }

    fn bounded(mut self, field: &str, start: Value, end: Value) -> Self {
        if !start.is_nullish() {
            self = self.filter_spec(FilterSpec::gte(field, start));
        }
        if !end.is_nullish() {
            self = self.filter_spec(FilterSpec::lte(field, end));
        }
        self
    }

    // ========================================================================
    // Aggregates
    // ========================================================================

    /// Adds an aggregate with a custom reducer, named `aggr_<field>`.
    pub fn aggregate(
        self,
        field: &str,
        reducer: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.aggregate_spec(AggregateSpec::custom(field, reducer))
    }

    /// Adds a pre-built aggregate spec, with its name and post-processing.
    pub fn aggregate_spec(mut self, spec: AggregateSpec) -> Self {
        self.aggregates.push(spec);
        self
    }

    /// Adds `sum_<field>`: arithmetic sum, `0` when empty.
    pub fn sum(self, field: &str) -> Self {
        self.aggregate_spec(AggregateSpec::sum(field))
    }

    /// Adds `mean_<field>`: arithmetic mean, `NaN` when empty.
    pub fn mean(self, field: &str) -> Self {
        self.aggregate_spec(AggregateSpec::mean(field))
    }

    /// Adds `uniq_<field>`: distinct values in first-occurrence order.
    pub fn uniq(self, field: &str) -> Self {
        self.aggregate_spec(AggregateSpec::uniq(field))
    }

    /// Adds `count_<field>`: number of distinct values.
    pub fn count(self, field: &str) -> Self {
        self.aggregate_spec(AggregateSpec::count(field))
    }

    /// Adds `min_<field>`.
    pub fn min(self, field: &str) -> Self {
        self.aggregate_spec(AggregateSpec::min(field))
    }

    /// Adds `max_<field>`.
    pub fn max(self, field: &str) -> Self {
        self.aggregate_spec(AggregateSpec::max(field))
    }

    /// Adds `range_<field>`: `[min, max]`.
    pub fn range(self, field: &str) -> Self {
        self.aggregate_spec(AggregateSpec::range(field))
    }

    /// Adds `<field>`: the first value.
    pub fn one(self, field: &str) -> Self {
        self.aggregate_spec(AggregateSpec::one(field))
    }

    // ========================================================================
    // Grouping
    // ========================================================================

    /// Replaces the group keys.
    ///
    /// Accepts a field name, a [`GroupKey`], or a list of either; each key
    /// adds one level of nesting.
    pub fn group_by(mut self, keys: impl Into<GroupKeys<R>>) -> Self {
        self.keys = keys.into().0;
        self
    }

    /// Clears the group keys.
    pub fn ungroup(mut self) -> Self {
        self.keys.clear();
        self
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Sorts top-level groups by key with the default [`collate`] comparator.
    ///
    /// [`collate`]: crate::collate
    pub fn sort_keys(mut self) -> Self {
        self.order = Some(KeyOrder::Collate);
        self
    }

    /// Sorts top-level groups by key with a custom comparator.
    ///
    /// The comparator sees normalized keys; `None` means incomparable.
    pub fn sort_keys_by(
        mut self,
        cmp: impl Fn(&Value, &Value) -> Option<Ordering> + Send + Sync + 'static,
    ) -> Self {
        self.order = Some(KeyOrder::By(Arc::new(cmp)));
        self
    }

    /// Clears key sorting; groups keep discovery order.
    pub fn unsorted(mut self) -> Self {
        self.order = None;
        self
    }

    /// Returns an independent builder with the same specs.
    ///
    /// Functions are shared by reference; later registrations on either
    /// builder do not affect the other.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the registered filters.
    pub fn filters(&self) -> &[FilterSpec<R>] {
        &self.filters
    }

    /// Returns the registered aggregates.
    pub fn aggregates(&self) -> &[AggregateSpec] {
        &self.aggregates
    }

    /// Returns the group keys.
    pub fn group_keys(&self) -> &[GroupKey<R>] {
        &self.keys
    }

    /// Returns `true` if top-level groups will be sorted.
    pub fn is_sorted(&self) -> bool {
        self.order.is_some()
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Tests if a single record passes every filter.
    pub fn matches<F>(&self, record: &R, accessor: F) -> bool
    where
        F: Fn(&R, &str) -> Value,
    {
        self.filters
            .iter()
            .all(|spec| spec.accepts(record, &accessor))
    }

    /// Runs the pipeline over records that implement [`Record`].
    pub fn evaluate<'r>(&self, records: &'r [R]) -> Vec<Group<'r, R>>
    where
        R: Record,
    {
        self.evaluate_with(records, R::accessor)
    }

    /// Runs the pipeline, reading fields through `accessor`.
    pub fn evaluate_with<'r, F>(&self, records: &'r [R], accessor: F) -> Vec<Group<'r, R>>
    where
        F: Fn(&R, &str) -> Value,
    {
        let filtered: Vec<&'r R> = records
            .iter()
            .filter(|record| self.matches(record, &accessor))
            .collect();
        let kept = filtered.len();

        let mut groups = partition(filtered, &self.keys, &self.aggregates, &accessor);

        if let Some(order) = &self.order {
            groups.sort_by(|a, b| order.compare(&a.key, &b.key));
        }

        debug!(
            input = records.len(),
            kept,
            groups = groups.len(),
            depth = self.keys.len(),
            "evaluated pipeline"
        );
        groups
    }
}

impl<R> Default for Aggro<R> {
    fn default() -> Self {
        Aggro::new()
    }
}

impl<R> Clone for Aggro<R> {
    fn clone(&self) -> Self {
        Aggro {
            filters: self.filters.clone(),
            aggregates: self.aggregates.clone(),
            keys: self.keys.clone(),
            order: self.order.clone(),
        }
    }
}

impl<R> fmt::Debug for Aggro<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggro")
            .field("filters", &self.filters)
            .field("aggregates", &self.aggregates)
            .field("keys", &self.keys)
            .field("order", &self.order)
            .finish()
    }
}
