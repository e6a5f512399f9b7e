//! Property-based tests for pipelines using proptest.

use std::collections::HashSet;

use aggro::{Aggro, Group, Record, Value};
use proptest::prelude::*;

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: usize,
    team: u8,
    tier: Option<u8>,
    score: i64,
    name: String,
}

impl Record for Row {
    fn field(&self, name: &str) -> Value {
        match name {
            "id" => Value::from(self.id),
            "team" => Value::from(self.team),
            "tier" => Value::from(self.tier),
            "score" => Value::from(self.score),
            "name" => Value::from(&self.name),
            _ => Value::Undefined,
        }
    }
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (0u8..4, prop::option::of(0u8..3), -50i64..50, "[a-c]{1,3}"),
        0..60,
    )
    .prop_map(|cols| {
        cols.into_iter()
            .enumerate()
            .map(|(id, (team, tier, score, name))| Row {
                id,
                team,
                tier,
                score,
                name,
            })
            .collect()
    })
}

fn ids(records: &[&Row]) -> Vec<usize> {
    records.iter().map(|r| r.id).collect()
}

/// Collects leaf records depth first, asserting every level is non-empty.
fn leaves<'r>(groups: &[Group<'r, Row>], out: &mut Vec<&'r Row>) {
    for group in groups {
        assert!(!group.is_empty());
        match group.groups() {
            Some(children) => leaves(children, out),
            None => out.extend(group.records().unwrap_or_default()),
        }
    }
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// A record passes the pipeline iff it passes each filter on its own.
    #[test]
    fn filters_are_a_conjunction(
        rows in rows_strategy(),
        team in 0u8..4,
        lo in -50i64..50,
        span in 0i64..60,
    ) {
        let by_team = Aggro::<Row>::new().filter_eq("team", team);
        let by_score = Aggro::<Row>::new().between("score", [lo, lo + span]);
        let both = by_team.copy().between("score", [lo, lo + span]);

        let kept = both.evaluate(&rows);
        let expected: Vec<usize> = rows
            .iter()
            .filter(|&r| by_team.matches(r, Row::accessor) && by_score.matches(r, Row::accessor))
            .map(|r| r.id)
            .collect();
        prop_assert_eq!(ids(kept[0].records().unwrap()), expected);
    }

    /// Adding a filter never grows the result.
    #[test]
    fn adding_filters_only_shrinks(
        rows in rows_strategy(),
        names in prop::collection::vec("[a-c]{1,3}", 0..4),
        threshold in -50i64..50,
    ) {
        let base = Aggro::new().is_in("name", names.clone());
        let narrowed = base.copy().filter(move |r: &Row| r.score > threshold);

        let wide = base.evaluate(&rows)[0].len();
        let narrow = narrowed.evaluate(&rows)[0].len();
        prop_assert!(narrow <= wide);
        prop_assert!(wide <= rows.len());
    }

    /// Leaves partition the filtered input: nothing lost, nothing duplicated,
    /// input order kept within each leaf.
    #[test]
    fn grouping_partitions_filtered_input(
        rows in rows_strategy(),
        min_score in -50i64..50,
    ) {
        let filtered = Aggro::new().between("score", (min_score, Value::Null));
        let grouped = filtered.copy().group_by(["team", "tier", "name"]);

        let flat = filtered.evaluate(&rows);
        let mut expected = ids(flat[0].records().unwrap());

        let groups = grouped.evaluate(&rows);
        let mut out = Vec::new();
        leaves(&groups, &mut out);
        let mut actual = ids(&out);

        let unique: HashSet<_> = actual.iter().copied().collect();
        prop_assert_eq!(unique.len(), actual.len());

        expected.sort_unstable();
        actual.sort_unstable();
        prop_assert_eq!(actual, expected);
    }

    /// Each level has one bucket per distinct key, in first-seen order.
    #[test]
    fn buckets_follow_first_occurrence(rows in rows_strategy()) {
        let groups = Aggro::new().group_by("tier").evaluate(&rows);

        let mut seen = Vec::new();
        for row in &rows {
            let key = Value::from(row.tier);
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        let keys: Vec<Value> = groups.iter().map(|g| g.key.clone()).collect();
        prop_assert_eq!(keys, seen);
    }

    /// Group aggregates are recomputed from each group's own members.
    #[test]
    fn aggregates_match_members(rows in rows_strategy()) {
        let groups = Aggro::new()
            .group_by(["team", "name"])
            .sum("score")
            .count("name")
            .evaluate(&rows);

        for team in &groups {
            let members = team.leaf_records();
            let total: i64 = members.iter().map(|r| r.score).sum();
            let names: HashSet<_> = members.iter().map(|r| r.name.as_str()).collect();
            prop_assert_eq!(team.get("sum_score"), Some(&Value::from(total)));
            prop_assert_eq!(team.get("count_name"), Some(&Value::from(names.len())));

            for child in team.groups().unwrap_or_default() {
                let total: i64 = child.leaf_records().iter().map(|r| r.score).sum();
                prop_assert_eq!(child.get("sum_score"), Some(&Value::from(total)));
                prop_assert_eq!(child.get("count_name"), Some(&Value::from(1)));
            }
        }
    }

    /// Sorting reorders top-level keys only.
    #[test]
    fn sort_is_top_level_only(rows in rows_strategy()) {
        let unsorted = Aggro::new().group_by(["team", "score"]);
        let sorted = unsorted.copy().sort_keys();

        let plain = unsorted.evaluate(&rows);
        let ordered = sorted.evaluate(&rows);

        let keys: Vec<Value> = ordered.iter().map(|g| g.key.clone()).collect();
        for pair in keys.windows(2) {
            prop_assert!(aggro::collate(&pair[0], &pair[1]).is_some_and(|o| o.is_le()));
        }
        for group in &ordered {
            let twin = plain.iter().find(|g| g.key == group.key);
            prop_assert_eq!(Some(group), twin);
        }
    }

    /// A copy evaluates identically, and changing it leaves the original alone.
    #[test]
    fn copy_is_independent(rows in rows_strategy(), team in 0u8..4) {
        let original = Aggro::new().group_by("team").mean("score").sort_keys();
        let before = original.evaluate(&rows);

        let copy = original.copy();
        prop_assert_eq!(copy.evaluate(&rows), before.clone());

        let changed = copy.filter_eq("team", team).ungroup();
        let _ = changed.evaluate(&rows);
        prop_assert_eq!(original.evaluate(&rows), before);
    }

    /// `count` equals the length of `uniq`.
    #[test]
    fn count_is_uniq_len(values in prop::collection::vec(-5i64..5, 0..40)) {
        let values: Vec<Value> = values.into_iter().map(Value::from).collect();
        prop_assert_eq!(
            aggro::reducers::count(&values),
            aggro::reducers::uniq(&values).len()
        );
    }
}
