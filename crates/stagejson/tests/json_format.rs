// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Output shaping and input diagnostics: filters, pretty printing, parse
// error positions, lenient input forms, targeted overrides and option
// profiles.

use stagejson::adapters::dynamic::DynamicValue;
use stagejson::dispatch::Strategy;
use stagejson::json::{self, JsonFormatter, JsonOptions};
use stagejson::{ParseErrorKind, Registry, Result, ValueReader, ValueWriter};

#[derive(Debug, Default, PartialEq, stagejson::Value)]
struct Sample {
    a: i32,
    b: String,
    c: Option<String>,
    d: i32,
}

fn sample() -> Sample {
    Sample {
        a: 0,
        b: String::new(),
        c: None,
        d: 1,
    }
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_all_filters_keep_only_meaningful_members() {
    let opts = JsonOptions::default().ignore_all();
    assert_eq!(json::serialize_with(&sample(), &opts).unwrap(), r#"{"d":1}"#);
}

#[test]
fn test_each_filter_alone() {
    let cases = [
        (JsonOptions::default().ignore_null(true), r#"{"a":0,"b":"","d":1}"#),
        (JsonOptions::default().ignore_zero(true), r#"{"b":"","c":null,"d":1}"#),
        (JsonOptions::default().ignore_empty(true), r#"{"a":0,"c":null,"d":1}"#),
    ];
    for (opts, expected) in cases {
        assert_eq!(json::serialize_with(&sample(), &opts).unwrap(), expected);
    }
}

#[test]
fn test_array_elements_filtered_only_on_request() {
    let values = vec![Some(0), None, Some(2)];
    let members_only = JsonOptions::default().ignore_all();
    assert_eq!(json::serialize_with(&values, &members_only).unwrap(), "[0,null,2]");

    let elements = members_only.filter_array_elements(true);
    assert_eq!(json::serialize_with(&values, &elements).unwrap(), "[2]");
}

#[test]
fn test_filtered_to_empty_keeps_brackets() {
    let empty = Sample {
        d: 0,
        ..sample()
    };
    let opts = JsonOptions::default().ignore_all();
    assert_eq!(json::serialize_with(&empty, &opts).unwrap(), "{}");
    assert_eq!(
        json::serialize_with(&empty, &JsonOptions::pretty().ignore_all()).unwrap(),
        "{}"
    );
}

// ============================================================================
// Pretty printing
// ============================================================================

#[test]
fn test_pretty_layout() {
    let value: DynamicValue = json::deserialize(r#"{"name":"x","list":[1,{"k":[]}],"empty":{}}"#).unwrap();
    let text = json::serialize_with(&value, &JsonOptions::pretty()).unwrap();
    let expected = "{\n  \"name\": \"x\",\n  \"list\": [\n    1,\n    {\n      \"k\": []\n    }\n  ],\n  \"empty\": {}\n}";
    assert_eq!(text, expected);
}

#[test]
fn test_custom_layout_strings() {
    let opts = JsonOptions::compact()
        .with_indent("\t")
        .with_line_break("\r\n")
        .with_key_separator_pad(" ");
    let text = json::serialize_with(&vec![1u8], &opts).unwrap();
    assert_eq!(text, "[\r\n\t1\r\n]");
}

// ============================================================================
// Parse errors
// ============================================================================

fn parse_failure(text: &str) -> stagejson::ParseError {
    json::deserialize::<DynamicValue>(text)
        .unwrap_err()
        .parse_error()
        .cloned()
        .unwrap_or_else(|| panic!("{:?} should fail to parse", text))
}

#[test]
fn test_error_positions() {
    let err = parse_failure("{\n  \"a\": [1, 2,\n  x]\n}");
    assert_eq!(err.kind, ParseErrorKind::InvalidLiteral);
    assert_eq!((err.line, err.column), (3, 3));
    assert_eq!(err.found, Some('x'));

    let err = parse_failure("[1, 2");
    assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
    assert_eq!(err.index, 5);
    assert_eq!(err.found, None);

    let err = parse_failure("{\"a\" 1}");
    assert_eq!(err.kind, ParseErrorKind::UnexpectedChar);
    assert_eq!(err.found, Some('1'));

    let err = parse_failure("[1] [2]");
    assert_eq!(err.kind, ParseErrorKind::TrailingCharacters);
    assert_eq!(err.column, 5);

    let err = parse_failure("[-]");
    assert_eq!(err.kind, ParseErrorKind::InvalidNumber);

    let err = parse_failure("");
    assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
}

#[test]
fn test_error_messages_name_the_location() {
    let err = json::deserialize::<Vec<u8>>("[1,\n?]").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("line 2, column 1"), "{}", message);
    assert!(message.contains("'?'"), "{}", message);
}

// ============================================================================
// Lenient input
// ============================================================================

#[test]
fn test_bare_keys_and_single_quotes() {
    let value: Sample = json::deserialize("{ a : 5, 'b': 'x', c : \"y\" , d:1,}").unwrap();
    assert_eq!(
        value,
        Sample {
            a: 5,
            b: "x".into(),
            c: Some("y".into()),
            d: 1,
        }
    );
}

#[test]
fn test_reformat_emits_strict_json() {
    let loose = "{ key : 'it\\'s', list: [ TRUE, Undefined, ], }";
    let text = json::reformat(loose, &JsonOptions::default()).unwrap();
    assert_eq!(text, r#"{"key":"it's","list":[true,null]}"#);
    serde_json::from_str::<serde_json::Value>(&text).unwrap();
}

// ============================================================================
// Targeted overrides
// ============================================================================

fn write_celsius<'a>(value: &'a f64, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
    writer.write_string(&format!("{:.1}C", value))
}

fn read_celsius(reader: &mut dyn ValueReader) -> Result<f64> {
    let text = reader.read_string()?;
    let number = text.trim_end_matches('C');
    number
        .parse()
        .map_err(|_| stagejson::Error::TypeMismatch {
            expected: "celsius",
            found: stagejson::BasicType::String,
        })
}

#[derive(Debug, Default, PartialEq, stagejson::Value)]
struct Reading {
    room: String,
    temperature: f64,
    history: Vec<f64>,
}

#[test]
fn test_formatter_override_applies_at_every_depth() {
    let formatter = JsonFormatter::new(JsonOptions::default());
    formatter.set_strategy(Strategy::<f64>::new(read_celsius, write_celsius));

    let reading = Reading {
        room: "lab".into(),
        temperature: 21.5,
        history: vec![20.0, 21.3],
    };
    let text = formatter.serialize(&reading).unwrap();
    assert_eq!(
        text,
        r#"{"room":"lab","temperature":"21.5C","history":["20.0C","21.3C"]}"#
    );
    let back: Reading = formatter.deserialize(&text).unwrap();
    assert_eq!(back.history, vec![20.0, 21.3]);

    // Other callers are untouched.
    assert_eq!(
        json::serialize(&reading).unwrap(),
        r#"{"room":"lab","temperature":21.5,"history":[20,21.3]}"#
    );
}

#[test]
fn test_override_sweep_on_drop() {
    let formatter = JsonFormatter::default();
    let id = formatter.id();
    formatter.set_strategy(Strategy::<f64>::new(read_celsius, write_celsius));
    assert!(Registry::global().has_targeted(id));
    assert!(Registry::global().targeted::<f64>(id).is_some());

    drop(formatter);
    assert!(!Registry::global().has_targeted(id));
    assert!(Registry::global().targeted::<f64>(id).is_none());
}

// ============================================================================
// Option profiles
// ============================================================================

#[test]
fn test_options_from_yaml_profile() {
    use std::io::Write;
    use stagejson::json::YamlLoader;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "default_profile: sparse\nprofiles:\n  sparse:\n    ignore_null: true\n    ignore_zero: true\n    ignore_empty: true"
    )
    .unwrap();

    let opts = YamlLoader::load_options(file.path(), None).unwrap();
    assert_eq!(json::serialize_with(&sample(), &opts).unwrap(), r#"{"d":1}"#);
}
