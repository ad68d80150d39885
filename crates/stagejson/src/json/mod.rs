// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON text codec over the value contracts.
//!
//! ```
//! use stagejson::json::{self, JsonOptions};
//!
//! #[derive(Debug, Default, PartialEq, stagejson::Value)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let text = json::serialize(&Point { x: 1, y: -2 }).unwrap();
//! assert_eq!(text, r#"{"x":1,"y":-2}"#);
//!
//! let back: Point = json::deserialize("{ x: 1, 'y': -2, }").unwrap();
//! assert_eq!(back, Point { x: 1, y: -2 });
//!
//! let pretty = json::reformat(&text, &JsonOptions::pretty()).unwrap();
//! assert_eq!(pretty, "{\n  \"x\": 1,\n  \"y\": -2\n}");
//! ```

mod deserializer;
mod formatter;
#[cfg(feature = "config-loaders")]
mod loaders;
mod number;
mod options;
mod output;
mod serializer;

pub use formatter::JsonFormatter;
#[cfg(feature = "config-loaders")]
pub use loaders::{YamlLoader, YamlOptionsDocument};
pub use options::{DepthPolicy, JsonOptions, ReferenceMode, DEFAULT_MAX_DEPTH};

use crate::contracts::ValueReader;
use crate::dispatch::{self, Registry, TypeKey, Value};
use crate::error::Result;
use deserializer::Deserializer;
use serializer::Serializer;
use std::any::Any;
use std::io;

/// Serialize with default options.
pub fn serialize<T: Value>(value: &T) -> Result<String> {
    serialize_with(value, &JsonOptions::default())
}

pub fn serialize_with<T: Value>(value: &T, opts: &JsonOptions) -> Result<String> {
    serialize_scoped(value, opts, None)
}

/// Serialize into an `io::Write` sink. Nothing is written if encoding fails.
pub fn serialize_to<T: Value, W: io::Write>(value: &T, mut sink: W, opts: &JsonOptions) -> Result<()> {
    let mut ser = Serializer::new(opts, None);
    dispatch::write_value(value, &mut ser)?;
    sink.write_all(ser.as_str().as_bytes())?;
    sink.flush()?;
    Ok(())
}

/// Deserialize with default options.
pub fn deserialize<T: Value>(text: &str) -> Result<T> {
    deserialize_with(text, &JsonOptions::default())
}

pub fn deserialize_with<T: Value>(text: &str, opts: &JsonOptions) -> Result<T> {
    deserialize_scoped(text, opts, None)
}

/// Deserialize a type known only by its [`TypeKey`].
///
/// The result downcasts to the keyed type.
pub fn deserialize_type(text: &str, key: TypeKey, opts: &JsonOptions) -> Result<Box<dyn Any>> {
    let slot = Registry::global().resolve_key(key)?;
    let strategy = slot.strategy()?;
    let mut de = Deserializer::new(text, opts, None);
    let value = strategy.read_boxed(&mut de)?;
    de.finish()?;
    Ok(value)
}

/// Serialize a value known only as `dyn Any`; `key` must name its type.
pub fn serialize_any(value: &dyn Any, key: TypeKey, opts: &JsonOptions) -> Result<String> {
    let slot = Registry::global().resolve_key(key)?;
    let strategy = slot.strategy()?;
    let mut ser = Serializer::new(opts, None);
    strategy.write_any(value, &mut ser)?;
    Ok(ser.into_string())
}

/// Re-emit JSON text under `opts`: normalizes leniencies, applies the
/// filters and the layout.
pub fn reformat(text: &str, opts: &JsonOptions) -> Result<String> {
    let mut de = Deserializer::new(text, opts, None);
    let mut ser = Serializer::new(opts, None);
    de.write_to(&mut ser)?;
    de.finish()?;
    Ok(ser.into_string())
}

pub(crate) fn serialize_scoped<T: Value>(
    value: &T,
    opts: &JsonOptions,
    targeted_id: Option<u64>,
) -> Result<String> {
    let mut ser = Serializer::new(opts, targeted_id);
    dispatch::write_value(value, &mut ser)?;
    Ok(ser.into_string())
}

pub(crate) fn deserialize_scoped<T: Value>(
    text: &str,
    opts: &JsonOptions,
    targeted_id: Option<u64>,
) -> Result<T> {
    let mut de = Deserializer::new(text, opts, targeted_id);
    let value = dispatch::read_value(&mut de)?;
    de.finish()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dynamic::DynamicValue;
    use crate::error::Error;

    #[test]
    fn test_serialize_to_sink() {
        let mut sink = Vec::new();
        serialize_to(&vec![1u8, 2], &mut sink, &JsonOptions::default()).unwrap();
        assert_eq!(sink, b"[1,2]");
    }

    #[test]
    fn test_failed_encode_writes_nothing() {
        let deep = vec![vec![vec![1u8]]];
        let mut sink = Vec::new();
        let opts = JsonOptions::default().with_max_depth(2);
        assert!(matches!(
            serialize_to(&deep, &mut sink, &opts),
            Err(Error::DepthExceeded { max_depth: 2 })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_type_erased_entry_points() {
        let key = TypeKey::of::<Vec<i64>>();
        let value = deserialize_type("[3, 4]", key, &JsonOptions::default()).unwrap();
        let typed = value.downcast_ref::<Vec<i64>>().unwrap();
        assert_eq!(typed, &vec![3, 4]);

        let text = serialize_any(typed, key, &JsonOptions::default()).unwrap();
        assert_eq!(text, "[3,4]");

        let wrong = serialize_any(&"nope", key, &JsonOptions::default());
        assert!(matches!(wrong, Err(Error::UnsupportedShape { .. })));
    }

    #[test]
    fn test_reformat_normalizes_leniencies() {
        let text = "{ a : 'x', b: [TRUE, undefined, 1.50, ], }";
        assert_eq!(
            reformat(text, &JsonOptions::default()).unwrap(),
            r#"{"a":"x","b":[true,null,1.5]}"#
        );
    }

    #[test]
    fn test_reformat_applies_filters() {
        let opts = JsonOptions::default().ignore_all();
        assert_eq!(
            reformat(r#"{"a":0,"b":"","c":null,"d":1}"#, &opts).unwrap(),
            r#"{"d":1}"#
        );
    }

    #[test]
    fn test_dynamic_round_trip() {
        let text = r#"["a",1,null,{"x":true}]"#;
        let value: DynamicValue = deserialize(text).unwrap();
        assert_eq!(serialize(&value).unwrap(), text);
    }
}
