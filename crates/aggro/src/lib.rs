//! Aggro - Declarative filter, group-by and aggregate pipelines.
//!
//! Aggro turns a flat list of records into a tree of groups. A pipeline is
//! declared once with a fluent builder and can be evaluated any number of
//! times. It supports:
//!
//! - Filters: predicates, field tests, equality, set membership, ranges
//! - Recursive grouping by one or more keys (field names or functions)
//! - Named aggregates per group: sum, mean, min, max, range, uniq, count, one,
//!   or any custom reducer
//! - Optional sorting of the top-level groups by key
//!
//! # Quick Start
//!
//! ```rust
//! use aggro::{Aggro, Value};
//! use serde_json::json;
//!
//! let sales = vec![
//!     json!({"region": "north", "rep": "ann", "amount": 10}),
//!     json!({"region": "south", "rep": "bob", "amount": 4}),
//!     json!({"region": "north", "rep": "cid", "amount": 6}),
//!     json!({"region": "north", "rep": "ann", "amount": 1}),
//! ];
//!
//! let groups = Aggro::new()
//!     .between("amount", [2, 100])
//!     .group_by(["region", "rep"])
//!     .sum("amount")
//!     .count("rep")
//!     .sort_keys()
//!     .evaluate(&sales);
//!
//! assert_eq!(groups.len(), 2);
//! assert_eq!(groups[0].key, Value::from("north"));
//! assert_eq!(groups[0].get("sum_amount"), Some(&Value::from(16)));
//! assert_eq!(groups[0].get("count_rep"), Some(&Value::from(2)));
//!
//! // one nested level per extra key
//! let reps = groups[0].groups().unwrap();
//! assert_eq!(reps[0].key, Value::from("ann"));
//! assert_eq!(reps[0].records().unwrap().len(), 1);
//! ```
//!
//! # Pipeline Semantics
//!
//! ```text
//! kept   = records accepted by every filter (input order preserved)
//! groups = partition(kept, keys[0]) -> partition(each, keys[1]) -> ...
//! each group carries every aggregate, computed over its records
//! top-level groups are sorted by key only when sorting is enabled
//! ```
//!
//! - Keys compare by normalized value: dates collapse to milliseconds, and
//!   `1`, `1.0` and `1u8` name the same group.
//! - Groups appear in first-seen order unless sorted.
//! - With no group keys, the result is a single group keyed `Null`.
//!
//! # Aggregate Names
//!
//! | Builder | Result name |
//! |---------|-------------|
//! | `sum("f")` | `sum_f` |
//! | `mean("f")` | `mean_f` |
//! | `min("f")` / `max("f")` | `min_f` / `max_f` |
//! | `range("f")` | `range_f` |
//! | `uniq("f")` / `count("f")` | `uniq_f` / `count_f` |
//! | `one("f")` | `f` |
//! | `aggregate("f", fn)` | `aggr_f` |
//!
//! Use [`AggregateSpec::named`] to pick another name.

mod error;
mod filter;
mod group;
mod normalize;
mod op;
mod ordering;
mod query;
mod record;
mod reduce;
mod value;

// Re-export public API
pub use error::{AggroError, Result};
pub use filter::{Between, FieldTest, FilterSpec, Predicate, ValueSet};
pub use group::{Group, GroupKey, GroupKeys, KeyFn, Members};
pub use normalize::{normalize, KeyIdentity};
pub use op::FilterOp;
pub use ordering::{collate, compare_values, Comparator, KeyOrder};
pub use query::Aggro;
pub use record::Record;
pub use reduce::{AggregateSpec, PostFn, ReduceFn, Reducer};
pub use value::{Number, Timestamp, Value};

/// The built-in reducers as plain functions over a list of values.
pub mod reducers {
    pub use crate::reduce::{count, extent, max, mean, min, range, sum, uniq};
}

#[cfg(feature = "derive")]
pub use aggro_macros::Record;
