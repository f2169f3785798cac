use serde_json::json;

use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// -----------------------------------------------------------------------
// parse_owners
// -----------------------------------------------------------------------

#[test]
fn owners_range_with_thousands_separators() {
    assert_eq!(
        parse_owners("10,000,000 .. 20,000,000"),
        OwnersRange {
            min: 10_000_000,
            max: 20_000_000
        }
    );
}

#[test]
fn owners_zero_lower_bound() {
    assert_eq!(
        parse_owners("0 .. 20,000"),
        OwnersRange { min: 0, max: 20_000 }
    );
}

#[test]
fn owners_bare_number() {
    assert_eq!(parse_owners("5000"), OwnersRange { min: 5000, max: 5000 });
}

#[test]
fn owners_garbage_is_zero() {
    assert_eq!(parse_owners("garbage"), OwnersRange { min: 0, max: 0 });
    assert_eq!(parse_owners(""), OwnersRange::default());
    assert_eq!(parse_owners("1,000 .. lots"), OwnersRange::default());
}

// -----------------------------------------------------------------------
// parse_release_date
// -----------------------------------------------------------------------

#[test]
fn release_date_common_formats_agree() {
    let expected = Some(date(2020, 3, 15));
    assert_eq!(parse_release_date("March 15, 2020"), expected);
    assert_eq!(parse_release_date("15 March 2020"), expected);
    assert_eq!(parse_release_date("2020-03-15"), expected);
}

#[test]
fn release_date_store_abbreviations() {
    assert_eq!(parse_release_date("Mar 15, 2020"), Some(date(2020, 3, 15)));
    assert_eq!(parse_release_date("15 Mar, 2020"), Some(date(2020, 3, 15)));
    assert_eq!(parse_release_date("  2 Nov, 2018 "), Some(date(2018, 11, 2)));
}

#[test]
fn release_date_quarter_maps_to_quarter_start() {
    assert_eq!(parse_release_date("Q1 2021"), Some(date(2021, 1, 1)));
    assert_eq!(parse_release_date("Q3 2024"), Some(date(2024, 7, 1)));
    assert_eq!(parse_release_date("q4 2022"), Some(date(2022, 10, 1)));
}

#[test]
fn release_date_bare_year_maps_to_january_first() {
    assert_eq!(parse_release_date("2021"), Some(date(2021, 1, 1)));
}

#[test]
fn release_date_rfc3339_timestamp() {
    assert_eq!(
        parse_release_date("2019-08-21T00:00:00Z"),
        Some(date(2019, 8, 21))
    );
}

#[test]
fn release_date_placeholders_are_none() {
    assert_eq!(parse_release_date("coming soon"), None);
    assert_eq!(parse_release_date("Coming Soon"), None);
    assert_eq!(parse_release_date("TBA"), None);
    assert_eq!(parse_release_date(""), None);
    assert_eq!(parse_release_date("when it's done"), None);
}

#[test]
fn month_start_truncates_day() {
    assert_eq!(month_start(date(2023, 5, 17)), date(2023, 5, 1));
}

// -----------------------------------------------------------------------
// lenient numbers
// -----------------------------------------------------------------------

#[test]
fn value_as_i64_handles_strings_numbers_and_blanks() {
    assert_eq!(value_as_i64(&json!(42)), Some(42));
    assert_eq!(value_as_i64(&json!("42")), Some(42));
    assert_eq!(value_as_i64(&json!(" 7 ")), Some(7));
    assert_eq!(value_as_i64(&json!(12.9)), Some(12));
    assert_eq!(value_as_i64(&json!("")), None);
    assert_eq!(value_as_i64(&json!(null)), None);
    assert_eq!(value_as_i64(&json!("n/a")), None);
}

#[test]
fn price_cents_accepts_string_or_number() {
    assert_eq!(parse_price_cents(&json!("999")), Some(999));
    assert_eq!(parse_price_cents(&json!(1999)), Some(1999));
    assert_eq!(parse_price_cents(&json!("0")), Some(0));
    assert_eq!(parse_price_cents(&json!(-5)), None);
    assert_eq!(parse_price_cents(&json!(null)), None);
}

#[derive(Debug, Deserialize)]
struct Lenient {
    #[serde(default, deserialize_with = "lenient_i32")]
    count: i32,
    #[serde(default, deserialize_with = "lenient_price_cents")]
    price: Option<i32>,
    #[serde(default, deserialize_with = "lenient_string")]
    label: Option<String>,
}

#[test]
fn lenient_deserializers_tolerate_mixed_types() {
    let parsed: Lenient =
        serde_json::from_value(json!({"count": "15", "price": "499", "label": ""})).unwrap();
    assert_eq!(parsed.count, 15);
    assert_eq!(parsed.price, Some(499));
    assert_eq!(parsed.label, None);

    let parsed: Lenient = serde_json::from_value(json!({"count": null, "label": " Valve "})).unwrap();
    assert_eq!(parsed.count, 0);
    assert_eq!(parsed.price, None);
    assert_eq!(parsed.label.as_deref(), Some("Valve"));
}
