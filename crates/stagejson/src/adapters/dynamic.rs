// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema-less values.
//!
//! [`DynamicValue`] is what a value looks like when nobody asked for a
//! concrete type. [`DynamicSequence`] and [`DynamicMap`] are the owned
//! structural readers/writers used whenever staged structures must outlive
//! their producer.

use super::maps::EntryReader;
use super::SliceReader;
use crate::contracts::{
    BasicType, MapReader, MapWriter, Opaque, SequenceReader, SequenceWriter, ValueReader,
    ValueWriter,
};
use crate::dispatch::Value;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use std::borrow::Cow;

/// Any value the contracts can carry.
///
/// Integers collapse to `I64` (signed tags) or `U64` (unsigned tags) and
/// floats to `F64`; everything else keeps its tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Decimal(Decimal),
    Char(char),
    DateTime(DateTime<FixedOffset>),
    String(String),
    Array(Vec<DynamicValue>),
    /// Members in source order.
    Object(Vec<(String, DynamicValue)>),
    Opaque(Opaque),
}

impl DynamicValue {
    pub fn basic_type(&self) -> BasicType {
        match self {
            Self::Null => BasicType::Null,
            Self::Bool(_) => BasicType::Bool,
            Self::I64(_) => BasicType::I64,
            Self::U64(_) => BasicType::U64,
            Self::F64(_) => BasicType::F64,
            Self::Decimal(_) => BasicType::Decimal,
            Self::Char(_) => BasicType::Char,
            Self::DateTime(_) => BasicType::DateTime,
            Self::String(_) => BasicType::String,
            Self::Array(_) => BasicType::Array,
            Self::Object(_) => BasicType::Object,
            Self::Opaque(_) => BasicType::Opaque,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DynamicValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// First member named `key`, if this is an object.
    pub fn get(&self, key: &str) -> Option<&DynamicValue> {
        match self {
            Self::Object(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<&str> for DynamicValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for DynamicValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for DynamicValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DynamicValue {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<u64> for DynamicValue {
    fn from(value: u64) -> Self {
        Self::U64(value)
    }
}

impl From<f64> for DynamicValue {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<Vec<DynamicValue>> for DynamicValue {
    fn from(value: Vec<DynamicValue>) -> Self {
        Self::Array(value)
    }
}

impl Value for DynamicValue {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        match self {
            Self::Null => writer.write_null(),
            Self::Bool(v) => writer.write_bool(*v),
            Self::I64(v) => writer.write_i64(*v),
            Self::U64(v) => writer.write_u64(*v),
            Self::F64(v) => writer.write_f64(*v),
            Self::Decimal(v) => writer.write_decimal(*v),
            Self::Char(v) => writer.write_char(*v),
            Self::DateTime(v) => writer.write_datetime(*v),
            Self::String(v) => writer.write_string(v),
            Self::Opaque(v) => writer.write_opaque(v.clone()),
            Self::Array(items) => writer.write_array(Box::new(SliceReader::new(items))),
            Self::Object(entries) => writer.write_object(Box::new(EntryReader::new(
                entries.iter().map(|(k, v)| (Cow::Borrowed(k.as_str()), v)),
            ))),
        }
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        Ok(match reader.basic_type()? {
            BasicType::Null => {
                reader.try_read_null()?;
                Self::Null
            }
            BasicType::Bool => Self::Bool(reader.read_bool()?),
            BasicType::I8 | BasicType::I16 | BasicType::I32 | BasicType::I64 => {
                Self::I64(reader.read_i64()?)
            }
            BasicType::U8 | BasicType::U16 | BasicType::U32 | BasicType::U64 => {
                Self::U64(reader.read_u64()?)
            }
            BasicType::F32 | BasicType::F64 => Self::F64(reader.read_f64()?),
            BasicType::Decimal => Self::Decimal(reader.read_decimal()?),
            BasicType::Char => Self::Char(reader.read_char()?),
            BasicType::DateTime => Self::DateTime(reader.read_datetime()?),
            BasicType::String => Self::String(reader.read_string()?),
            BasicType::Opaque => Self::Opaque(reader.read_opaque()?),
            BasicType::Array => {
                let mut items = DynamicSequence::default();
                reader.read_array(&mut items)?;
                Self::Array(items.into_inner())
            }
            BasicType::Object => {
                let mut entries = DynamicMap::default();
                reader.read_object(&mut entries)?;
                Self::Object(entries.into_inner())
            }
        })
    }
}

/// Owned, schema-less sequence.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DynamicSequence {
    items: Vec<DynamicValue>,
}

impl DynamicSequence {
    pub fn into_inner(self) -> Vec<DynamicValue> {
        self.items
    }
}

impl SequenceWriter for DynamicSequence {
    fn initialize(&mut self, capacity: usize) {
        self.items.reserve(capacity);
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    fn write_value(&mut self, index: usize, src: &mut dyn ValueReader) -> Result<()> {
        let value = DynamicValue::read_value(src)?;
        match self.items.get_mut(index) {
            Some(slot) => *slot = value,
            None => self.items.push(value),
        }
        Ok(())
    }
}

impl SequenceReader for DynamicSequence {
    fn count(&self) -> usize {
        self.items.len()
    }

    fn read_value<'s>(&'s self, index: usize, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        match self.items.get(index) {
            Some(item) => item.write_value(dest),
            None => Err(Error::unsupported(
                "DynamicSequence",
                format!("index {} out of range for {} elements", index, self.items.len()),
            )),
        }
    }
}

/// Owned, schema-less map. A repeated key replaces the earlier value in place.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DynamicMap {
    entries: Vec<(String, DynamicValue)>,
}

impl DynamicMap {
    pub fn into_inner(self) -> Vec<(String, DynamicValue)> {
        self.entries
    }
}

impl MapWriter for DynamicMap {
    fn initialize(&mut self, capacity: usize) {
        self.entries.reserve(capacity);
    }

    fn count(&self) -> usize {
        self.entries.len()
    }

    fn write_value(&mut self, key: &str, src: &mut dyn ValueReader) -> Result<()> {
        let value = DynamicValue::read_value(src)?;
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key.to_owned(), value)),
        }
        Ok(())
    }
}

impl MapReader for DynamicMap {
    fn count(&self) -> usize {
        self.entries.len()
    }

    fn keys(&self) -> Vec<Cow<'_, str>> {
        self.entries
            .iter()
            .map(|(k, _)| Cow::Borrowed(k.as_str()))
            .collect()
    }

    fn read_value<'s>(&'s self, key: &str, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        match self.entries.iter().find(|(k, _)| k == key) {
            Some((_, value)) => value.write_value(dest),
            None => Err(Error::MissingMember {
                type_name: "DynamicMap",
                member: key.to_owned(),
            }),
        }
    }
}
