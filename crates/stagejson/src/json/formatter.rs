// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Options plus a private set of strategy overrides.

use super::{deserialize_scoped, serialize_scoped, JsonOptions};
use crate::dispatch::{Registry, Strategy, Value};
use crate::error::Result;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

/// Formatter ids live above this so they never meet ids chosen by hand.
const FORMATTER_ID_BASE: u64 = 1 << 48;

static NEXT_ID: AtomicU64 = AtomicU64::new(FORMATTER_ID_BASE);

/// A JSON codec scope.
///
/// Strategies set through [`set_strategy`](Self::set_strategy) apply only to
/// calls made through this formatter, at any depth, and are removed from the
/// global registry when the formatter is dropped.
///
/// ```
/// use stagejson::dispatch::Strategy;
/// use stagejson::json::{self, JsonFormatter, JsonOptions};
/// use stagejson::{Result, ValueReader, ValueWriter};
///
/// fn write_shouting<'a>(value: &'a String, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
///     writer.write_string(&value.to_uppercase())
/// }
///
/// fn read_plain(reader: &mut dyn ValueReader) -> Result<String> {
///     reader.read_string()
/// }
///
/// let formatter = JsonFormatter::new(JsonOptions::default());
/// formatter.set_strategy(Strategy::<String>::new(read_plain, write_shouting));
///
/// let words = vec!["hi".to_string()];
/// assert_eq!(formatter.serialize(&words).unwrap(), r#"["HI"]"#);
/// assert_eq!(json::serialize(&words).unwrap(), r#"["hi"]"#);
/// ```
#[derive(Debug)]
pub struct JsonFormatter {
    id: u64,
    options: JsonOptions,
}

impl JsonFormatter {
    pub fn new(options: JsonOptions) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        log::trace!("[json] formatter {} created", id);
        Self { id, options }
    }

    /// Id reported by this formatter's readers and writers.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn options(&self) -> &JsonOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut JsonOptions {
        &mut self.options
    }

    /// Override `T`'s strategy for this formatter only. Replaces any
    /// earlier override for `T`.
    pub fn set_strategy<T: Value>(&self, strategy: Strategy<T>) {
        Registry::global().register_targeted(self.id, strategy);
    }

    pub fn serialize<T: Value>(&self, value: &T) -> Result<String> {
        serialize_scoped(value, &self.options, Some(self.id))
    }

    pub fn serialize_to<T: Value, W: io::Write>(&self, value: &T, mut sink: W) -> Result<()> {
        let text = self.serialize(value)?;
        sink.write_all(text.as_bytes())?;
        sink.flush()?;
        Ok(())
    }

    pub fn deserialize<T: Value>(&self, text: &str) -> Result<T> {
        deserialize_scoped(text, &self.options, Some(self.id))
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new(JsonOptions::default())
    }
}

impl Drop for JsonFormatter {
    fn drop(&mut self) {
        Registry::global().remove_targeted(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{ValueReader, ValueWriter};

    fn write_doubled<'a>(value: &'a u32, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_u64(u64::from(*value) * 2)
    }

    fn read_halved(reader: &mut dyn ValueReader) -> Result<u32> {
        Ok(reader.read_u32()? / 2)
    }

    #[test]
    fn test_ids_are_unique() {
        let a = JsonFormatter::default();
        let b = JsonFormatter::default();
        assert_ne!(a.id(), b.id());
        assert!(a.id() >= FORMATTER_ID_BASE);
    }

    #[test]
    fn test_override_reaches_nested_values() {
        let formatter = JsonFormatter::default();
        formatter.set_strategy(Strategy::<u32>::new(read_halved, write_doubled));

        let values: Vec<Option<u32>> = vec![Some(1), None, Some(5)];
        assert_eq!(formatter.serialize(&values).unwrap(), "[2,null,10]");
        assert_eq!(
            formatter.deserialize::<Vec<Option<u32>>>("[2,null,10]").unwrap(),
            values
        );
        assert_eq!(crate::json::serialize(&values).unwrap(), "[1,null,5]");
    }

    #[test]
    fn test_drop_sweeps_overrides() {
        let formatter = JsonFormatter::default();
        let id = formatter.id();
        formatter.set_strategy(Strategy::<u32>::new(read_halved, write_doubled));
        assert!(Registry::global().has_targeted(id));
        drop(formatter);
        assert!(!Registry::global().has_targeted(id));
    }

    #[test]
    fn test_serialize_to_sink() {
        let mut formatter = JsonFormatter::default();
        formatter.options_mut().indent = Some(" ".into());
        let mut sink = Vec::new();
        formatter.serialize_to(&vec![true], &mut sink).unwrap();
        assert_eq!(String::from_utf8(sink).unwrap(), "[\n true\n]");
    }
}
