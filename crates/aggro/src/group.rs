//! Group keys, the result tree, and the recursive partitioner.
//!
//! Partitioning buckets records by the normalized value of the first group
//! key, in first-encounter order, computes every aggregate over each bucket's
//! records, and recurses into the bucket with the remaining keys. A group
//! stores the raw key of the first record that opened its bucket, so a `Date`
//! key stays a `Date`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::trace;

use crate::normalize::KeyIdentity;
use crate::reduce::AggregateSpec;
use crate::value::Value;

/// Key extractor over a whole record.
pub type KeyFn<R> = Arc<dyn Fn(&R) -> Value + Send + Sync>;

/// One level of grouping: a field name or a key extractor.
pub enum GroupKey<R> {
    /// Group by the value of a field.
    Field(String),
    /// Group by a value computed from the record.
    Extract(KeyFn<R>),
}

impl<R> GroupKey<R> {
    /// Groups by a field.
    pub fn field(name: impl Into<String>) -> Self {
        GroupKey::Field(name.into())
    }

    /// Groups by a computed key.
    ///
    /// ```
    /// use aggro::{Aggro, GroupKey, Value};
    /// use serde_json::json;
    ///
    /// let decade = GroupKey::by(|r: &serde_json::Value| {
    ///     Value::from(r["year"].as_i64().map(|y| y / 10 * 10))
    /// });
    ///
    /// let rows = vec![json!({"year": 1987}), json!({"year": 1981}), json!({"year": 1990})];
    /// let groups = Aggro::new().group_by(decade).evaluate(&rows);
    /// assert_eq!(groups[0].key, Value::from(1980));
    /// assert_eq!(groups[0].len(), 2);
    /// ```
    pub fn by(extract: impl Fn(&R) -> Value + Send + Sync + 'static) -> Self {
        GroupKey::Extract(Arc::new(extract))
    }

    /// Extracts this key's raw value from a record.
    pub fn extract<F>(&self, record: &R, accessor: &F) -> Value
    where
        F: Fn(&R, &str) -> Value,
    {
        match self {
            GroupKey::Field(name) => accessor(record, name),
            GroupKey::Extract(extract) => extract(record),
        }
    }

    /// Returns the field name of a field key.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            GroupKey::Field(name) => Some(name),
            GroupKey::Extract(_) => None,
        }
    }
}

impl<R> Clone for GroupKey<R> {
    fn clone(&self) -> Self {
        match self {
            GroupKey::Field(name) => GroupKey::Field(name.clone()),
            GroupKey::Extract(extract) => GroupKey::Extract(Arc::clone(extract)),
        }
    }
}

impl<R> fmt::Debug for GroupKey<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Field(name) => f.debug_tuple("Field").field(name).finish(),
            GroupKey::Extract(_) => f.write_str("Extract(<fn>)"),
        }
    }
}

impl<R> From<&str> for GroupKey<R> {
    fn from(name: &str) -> Self {
        GroupKey::Field(name.to_string())
    }
}

impl<R> From<String> for GroupKey<R> {
    fn from(name: String) -> Self {
        GroupKey::Field(name)
    }
}

/// Ordered list of group keys, one nesting level per key.
pub struct GroupKeys<R>(pub Vec<GroupKey<R>>);

impl<R> From<&str> for GroupKeys<R> {
    fn from(name: &str) -> Self {
        GroupKeys(vec![GroupKey::from(name)])
    }
}

impl<R> From<String> for GroupKeys<R> {
    fn from(name: String) -> Self {
        GroupKeys(vec![GroupKey::from(name)])
    }
}

impl<R> From<GroupKey<R>> for GroupKeys<R> {
    fn from(key: GroupKey<R>) -> Self {
        GroupKeys(vec![key])
    }
}

impl<R, T: Into<GroupKey<R>>> From<Vec<T>> for GroupKeys<R> {
    fn from(keys: Vec<T>) -> Self {
        GroupKeys(keys.into_iter().map(Into::into).collect())
    }
}

impl<R, T: Into<GroupKey<R>>, const N: usize> From<[T; N]> for GroupKeys<R> {
    fn from(keys: [T; N]) -> Self {
        GroupKeys(keys.into_iter().map(Into::into).collect())
    }
}

/// Members of a group: records at the leaf level, child groups above it.
#[derive(Debug, PartialEq)]
pub enum Members<'r, R> {
    /// Original input records, in input order.
    Records(Vec<&'r R>),
    /// Child groups, in discovery order.
    Groups(Vec<Group<'r, R>>),
}

impl<'r, R> Clone for Members<'r, R> {
    fn clone(&self) -> Self {
        match self {
            Members::Records(records) => Members::Records(records.clone()),
            Members::Groups(groups) => Members::Groups(groups.clone()),
        }
    }
}

/// A node of the result tree.
///
/// `key` is the raw partition value (`Null` when no grouping is set),
/// `values` holds the members, and each registered aggregate is stored under
/// its result name.
#[derive(Debug, PartialEq)]
pub struct Group<'r, R> {
    /// Raw key shared by the members.
    pub key: Value,
    /// Member records or child groups.
    pub values: Members<'r, R>,
    aggregates: Vec<(String, Value)>,
}

impl<'r, R> Clone for Group<'r, R> {
    fn clone(&self) -> Self {
        Group {
            key: self.key.clone(),
            values: self.values.clone(),
            aggregates: self.aggregates.clone(),
        }
    }
}

impl<'r, R> Group<'r, R> {
    fn new(key: Value, records: Vec<&'r R>) -> Self {
        Group {
            key,
            values: Members::Records(records),
            aggregates: Vec::new(),
        }
    }

    /// Returns the raw key.
    pub fn key(&self) -> &Value {
        &self.key
    }

    /// Returns the member records of a leaf group.
    pub fn records(&self) -> Option<&[&'r R]> {
        match &self.values {
            Members::Records(records) => Some(records),
            Members::Groups(_) => None,
        }
    }

    /// Returns the child groups of an intermediate group.
    pub fn groups(&self) -> Option<&[Group<'r, R>]> {
        match &self.values {
            Members::Records(_) => None,
            Members::Groups(groups) => Some(groups),
        }
    }

    /// Returns `true` if this group holds records rather than child groups.
    pub fn is_leaf(&self) -> bool {
        matches!(self.values, Members::Records(_))
    }

    /// Returns the number of direct members.
    pub fn len(&self) -> usize {
        match &self.values {
            Members::Records(records) => records.len(),
            Members::Groups(groups) => groups.len(),
        }
    }

    /// Returns `true` if the group has no direct members.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every record beneath this group, in tree order.
    pub fn leaf_records(&self) -> Vec<&'r R> {
        match &self.values {
            Members::Records(records) => records.clone(),
            Members::Groups(groups) => groups.iter().flat_map(Group::leaf_records).collect(),
        }
    }

    /// Returns an aggregate result by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.aggregates
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Iterates over aggregate results in registration order.
    pub fn aggregates(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.aggregates.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Stores an aggregate result; a repeated name keeps its first position.
    fn set(&mut self, name: &str, value: Value) {
        match self.aggregates.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.aggregates.push((name.to_string(), value)),
        }
    }
}

/// Serializes as `{ "key": .., "values": [..], <aggregate>: .. }`.
impl<R: Serialize> Serialize for Group<'_, R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.aggregates.len()))?;
        map.serialize_entry("key", &self.key)?;
        match &self.values {
            Members::Records(records) => map.serialize_entry("values", records)?,
            Members::Groups(groups) => map.serialize_entry("values", groups)?,
        }
        for (name, value) in &self.aggregates {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Splits `records` into one nesting level per key.
///
/// With no keys left, the records form a single group keyed `Null`.
pub(crate) fn partition<'r, R, F>(
    records: Vec<&'r R>,
    keys: &[GroupKey<R>],
    aggregates: &[AggregateSpec],
    accessor: &F,
) -> Vec<Group<'r, R>>
where
    F: Fn(&R, &str) -> Value,
{
    let Some((first, rest)) = keys.split_first() else {
        let mut group = Group::new(Value::Null, records);
        compute_aggregates(&mut group, aggregates, accessor);
        return vec![group];
    };

    let mut buckets: Vec<Group<'r, R>> = Vec::new();
    let mut index: HashMap<KeyIdentity, usize> = HashMap::new();
    for record in records {
        let key = first.extract(record, accessor);
        match index.entry(KeyIdentity::of(&key)) {
            Entry::Occupied(slot) => {
                if let Members::Records(members) = &mut buckets[*slot.get()].values {
                    members.push(record);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(buckets.len());
                buckets.push(Group::new(key, vec![record]));
            }
        }
    }
    trace!(
        buckets = buckets.len(),
        remaining_keys = rest.len(),
        "partitioned level"
    );

    for group in &mut buckets {
        compute_aggregates(group, aggregates, accessor);
        if !rest.is_empty() {
            if let Members::Records(members) = &mut group.values {
                let members = std::mem::take(members);
                group.values = Members::Groups(partition(members, rest, aggregates, accessor));
            }
        }
    }
    buckets
}

/// Computes every aggregate over a leaf group's records.
fn compute_aggregates<R, F>(group: &mut Group<'_, R>, aggregates: &[AggregateSpec], accessor: &F)
where
    F: Fn(&R, &str) -> Value,
{
    let Members::Records(records) = &group.values else {
        return;
    };
    let results: Vec<Value> = aggregates
        .iter()
        .map(|spec| {
            let values: Vec<Value> = records
                .iter()
                .map(|&record| accessor(record, spec.field()))
                .filter(|value| !value.is_undefined())
                .collect();
            spec.apply(&values)
        })
        .collect();
    for (spec, result) in aggregates.iter().zip(results) {
        group.set(spec.name(), result);
    }
}
