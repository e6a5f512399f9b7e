//! Tests for `#[derive(Record)]`.

use aggro::{Aggro, Record, Timestamp, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Channel {
    Web,
    Store,
}

fn channel_value(channel: &Channel) -> Value {
    match channel {
        Channel::Web => Value::from("web"),
        Channel::Store => Value::from("store"),
    }
}

#[derive(Debug, Clone, aggro_macros::Record)]
struct Sale {
    region: String,
    #[record(rename = "total")]
    amount: f64,
    units: u32,
    sold_at: Timestamp,
    #[record(with = "channel_value")]
    channel: Channel,
    note: Option<String>,
    #[record(skip)]
    #[allow(dead_code)]
    internal_id: u64,
}

fn sales() -> Vec<Sale> {
    let sale = |region: &str, amount: f64, units: u32, day: i64, channel: Channel| Sale {
        region: region.to_string(),
        amount,
        units,
        sold_at: Timestamp::from_secs(day * 86_400),
        channel,
        note: None,
        internal_id: 0,
    };
    vec![
        sale("north", 10.0, 2, 0, Channel::Web),
        sale("south", 4.0, 1, 0, Channel::Store),
        sale("north", 6.5, 3, 1, Channel::Store),
        sale("north", 1.5, 1, 1, Channel::Web),
    ]
}

#[test]
fn generates_constants() {
    assert_eq!(Sale::REGION, "region");
    assert_eq!(Sale::TOTAL, "total");
    assert_eq!(Sale::UNITS, "units");
    assert_eq!(Sale::SOLD_AT, "sold_at");
    assert_eq!(Sale::CHANNEL, "channel");
    assert_eq!(Sale::NOTE, "note");
}

#[test]
fn field_access() {
    let sale = &sales()[0];
    assert_eq!(sale.field("region"), Value::from("north"));
    assert_eq!(sale.field("total"), Value::from(10.0));
    assert_eq!(sale.field("units"), Value::from(2u32));
    assert_eq!(sale.field("sold_at"), Value::Date(Timestamp(0)));
    assert_eq!(sale.field("channel"), Value::from("web"));
    assert_eq!(sale.field("note"), Value::Null);
}

#[test]
fn renamed_and_skipped_fields_are_hidden() {
    let sale = &sales()[0];
    assert_eq!(sale.field("amount"), Value::Undefined);
    assert_eq!(sale.field("internal_id"), Value::Undefined);
    assert_eq!(sale.field("missing"), Value::Undefined);
}

#[test]
fn pipeline_over_derived_records() {
    let rows = sales();
    let groups = Aggro::new()
        .filter_eq(Sale::CHANNEL, "web")
        .group_by(Sale::REGION)
        .sum(Sale::TOTAL)
        .sum(Sale::UNITS)
        .evaluate(&rows);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, Value::from("north"));
    assert_eq!(groups[0].get("sum_total"), Some(&Value::from(11.5)));
    assert_eq!(groups[0].get("sum_units"), Some(&Value::from(3)));
}

#[test]
fn group_by_derived_dates() {
    let rows = sales();
    let groups = Aggro::new()
        .group_by([Sale::SOLD_AT, Sale::REGION])
        .count(Sale::CHANNEL)
        .sort_keys_by(|a, b| aggro::collate(b, a))
        .evaluate(&rows);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key, Value::Date(Timestamp::from_secs(86_400)));
    assert_eq!(groups[0].get("count_channel"), Some(&Value::from(2)));
    assert_eq!(groups[1].groups().map(<[_]>::len), Some(2));
}
