// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tagged-union staging buffer.

use crate::adapters::dynamic::{DynamicMap, DynamicSequence};
use crate::contracts::{
    bool_from_str, char_from_str, datetime_from_str, decimal_from_f64, decimal_from_str,
    decimal_to_integer, f64_to_integer, parse_scalar, BasicType, MapReader, MapWriter,
    MemberPolicy, Opaque, SequenceReader, SequenceWriter, ValueReader, ValueWriter,
};
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use rust_decimal::Decimal;
use std::fmt;

enum Slot<'a> {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Char(char),
    DateTime(DateTime<FixedOffset>),
    String(String),
    Opaque(Opaque),
    Array(Box<dyn SequenceReader + 'a>),
    Object(Box<dyn MapReader + 'a>),
}

/// One staged value.
///
/// Acts as a [`ValueWriter`] while a producer fills it and as a
/// [`ValueReader`] while a consumer drains it. Scalars are stored inline;
/// arrays and objects keep the producer's reader and are only walked when
/// the buffer is replayed.
///
/// Every write replaces the previous tag and payload; reads never consume.
pub struct ValueBuffer<'a> {
    slot: Slot<'a>,
    policy: MemberPolicy,
    targeted_id: Option<u64>,
}

impl Default for ValueBuffer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ValueBuffer<'a> {
    pub fn new() -> Self {
        Self::scoped(MemberPolicy::LENIENT, None)
    }

    /// Empty buffer that reports `policy` and `targeted_id` to whoever
    /// reads from or writes into it.
    pub fn scoped(policy: MemberPolicy, targeted_id: Option<u64>) -> Self {
        Self {
            slot: Slot::Null,
            policy,
            targeted_id,
        }
    }

    /// Current tag.
    pub fn tag(&self) -> BasicType {
        match &self.slot {
            Slot::Null => BasicType::Null,
            Slot::Bool(_) => BasicType::Bool,
            Slot::I8(_) => BasicType::I8,
            Slot::I16(_) => BasicType::I16,
            Slot::I32(_) => BasicType::I32,
            Slot::I64(_) => BasicType::I64,
            Slot::U8(_) => BasicType::U8,
            Slot::U16(_) => BasicType::U16,
            Slot::U32(_) => BasicType::U32,
            Slot::U64(_) => BasicType::U64,
            Slot::F32(_) => BasicType::F32,
            Slot::F64(_) => BasicType::F64,
            Slot::Decimal(_) => BasicType::Decimal,
            Slot::Char(_) => BasicType::Char,
            Slot::DateTime(_) => BasicType::DateTime,
            Slot::String(_) => BasicType::String,
            Slot::Opaque(_) => BasicType::Opaque,
            Slot::Array(_) => BasicType::Array,
            Slot::Object(_) => BasicType::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.slot, Slot::Null)
    }

    /// Numeric zero of any width, including `-0.0` and a zero decimal.
    pub fn is_zero(&self) -> bool {
        match &self.slot {
            Slot::I8(v) => *v == 0,
            Slot::I16(v) => *v == 0,
            Slot::I32(v) => *v == 0,
            Slot::I64(v) => *v == 0,
            Slot::U8(v) => *v == 0,
            Slot::U16(v) => *v == 0,
            Slot::U32(v) => *v == 0,
            Slot::U64(v) => *v == 0,
            Slot::F32(v) => *v == 0.0,
            Slot::F64(v) => *v == 0.0,
            Slot::Decimal(v) => v.is_zero(),
            _ => false,
        }
    }

    pub fn is_empty_string(&self) -> bool {
        matches!(&self.slot, Slot::String(s) if s.is_empty())
    }

    /// Staged text, if the buffer holds a string.
    pub fn as_str(&self) -> Option<&str> {
        match &self.slot {
            Slot::String(s) => Some(s),
            _ => None,
        }
    }

    /// Drop the payload and go back to null.
    pub fn clear(&mut self) {
        self.slot = Slot::Null;
    }

    /// Replay the staged value into `dest` without consuming it.
    ///
    /// Structures are handed over as borrowed readers, so `dest` sees the
    /// same identities the producer exposed.
    pub fn replay<'s>(&'s self, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        match &self.slot {
            Slot::Array(reader) => dest.write_array(Box::new(&**reader)),
            Slot::Object(reader) => dest.write_object(Box::new(&**reader)),
            _ => self.replay_scalar(dest),
        }
    }

    /// Replay into a destination that may outlive this buffer.
    ///
    /// Structures are copied into owned dynamic readers first; identities
    /// are lost in the copy.
    pub fn replay_owned(&self, dest: &mut dyn ValueWriter<'_>) -> Result<()> {
        match &self.slot {
            Slot::Array(reader) => {
                let mut items = DynamicSequence::default();
                reader.read_all(&mut items)?;
                dest.write_array(Box::new(items))
            }
            Slot::Object(reader) => {
                let mut entries = DynamicMap::default();
                reader.read_all(&mut entries)?;
                dest.write_object(Box::new(entries))
            }
            _ => self.replay_scalar(dest),
        }
    }

    fn replay_scalar(&self, dest: &mut dyn ValueWriter<'_>) -> Result<()> {
        match &self.slot {
            Slot::Null => dest.write_null(),
            Slot::Bool(v) => dest.write_bool(*v),
            Slot::I8(v) => dest.write_i8(*v),
            Slot::I16(v) => dest.write_i16(*v),
            Slot::I32(v) => dest.write_i32(*v),
            Slot::I64(v) => dest.write_i64(*v),
            Slot::U8(v) => dest.write_u8(*v),
            Slot::U16(v) => dest.write_u16(*v),
            Slot::U32(v) => dest.write_u32(*v),
            Slot::U64(v) => dest.write_u64(*v),
            Slot::F32(v) => dest.write_f32(*v),
            Slot::F64(v) => dest.write_f64(*v),
            Slot::Decimal(v) => dest.write_decimal(*v),
            Slot::Char(v) => dest.write_char(*v),
            Slot::DateTime(v) => dest.write_datetime(*v),
            Slot::String(v) => dest.write_string(v),
            Slot::Opaque(v) => dest.write_opaque(v.clone()),
            Slot::Array(_) | Slot::Object(_) => Err(Error::unsupported(
                "ValueBuffer",
                "structures are replayed through replay()",
            )),
        }
    }

    /// Widen any integer-compatible payload, then narrow into `T`.
    fn read_integer<T: TryFrom<i128>>(&self, expected: &'static str) -> Result<T> {
        let found = self.tag();
        let wide: i128 = match &self.slot {
            Slot::Bool(v) => i128::from(*v),
            Slot::I8(v) => i128::from(*v),
            Slot::I16(v) => i128::from(*v),
            Slot::I32(v) => i128::from(*v),
            Slot::I64(v) => i128::from(*v),
            Slot::U8(v) => i128::from(*v),
            Slot::U16(v) => i128::from(*v),
            Slot::U32(v) => i128::from(*v),
            Slot::U64(v) => i128::from(*v),
            Slot::F32(v) => return f64_to_integer(f64::from(*v), expected, found),
            Slot::F64(v) => return f64_to_integer(*v, expected, found),
            Slot::Decimal(v) => return decimal_to_integer(*v, expected),
            Slot::String(s) => match parse_scalar::<i128>(s, expected) {
                Ok(v) => v,
                Err(_) => {
                    let float = parse_scalar::<f64>(s, expected)?;
                    return f64_to_integer(float, expected, found);
                }
            },
            _ => return Err(Error::mismatch(expected, found)),
        };
        T::try_from(wide).map_err(|_| Error::mismatch(expected, found))
    }

    fn read_float(&self, expected: &'static str) -> Result<f64> {
        let found = self.tag();
        Ok(match &self.slot {
            Slot::Null => 0.0,
            Slot::Bool(v) => f64::from(u8::from(*v)),
            Slot::I8(v) => f64::from(*v),
            Slot::I16(v) => f64::from(*v),
            Slot::I32(v) => f64::from(*v),
            Slot::I64(v) => *v as f64,
            Slot::U8(v) => f64::from(*v),
            Slot::U16(v) => f64::from(*v),
            Slot::U32(v) => f64::from(*v),
            Slot::U64(v) => *v as f64,
            Slot::F32(v) => f64::from(*v),
            Slot::F64(v) => *v,
            // Through the digits: `Decimal`'s own float conversion is not
            // correctly rounded.
            Slot::Decimal(v) => parse_scalar::<f64>(&v.to_string(), expected)?,
            Slot::String(s) => parse_scalar::<f64>(s, expected)?,
            _ => return Err(Error::mismatch(expected, found)),
        })
    }
}

impl fmt::Debug for ValueBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.slot {
            Slot::Null => write!(f, "ValueBuffer(null)"),
            Slot::Bool(v) => write!(f, "ValueBuffer({})", v),
            Slot::String(v) => write!(f, "ValueBuffer({:?})", v),
            Slot::Array(r) => write!(f, "ValueBuffer(array[{}])", r.count()),
            Slot::Object(r) => write!(f, "ValueBuffer(object[{}])", r.count()),
            _ => write!(f, "ValueBuffer({})", self.tag()),
        }
    }
}

impl ValueReader for ValueBuffer<'_> {
    fn basic_type(&mut self) -> Result<BasicType> {
        Ok(self.tag())
    }

    fn try_read_null(&mut self) -> Result<bool> {
        Ok(self.is_null())
    }

    fn read_bool(&mut self) -> Result<bool> {
        match &self.slot {
            Slot::Null => Ok(false),
            Slot::Bool(v) => Ok(*v),
            Slot::F32(v) => Ok(*v != 0.0),
            Slot::F64(v) => Ok(*v != 0.0),
            Slot::Decimal(v) => Ok(!v.is_zero()),
            Slot::String(s) => bool_from_str(s),
            _ => self.read_integer::<i128>("bool").map(|v| v != 0),
        }
    }

    fn read_i8(&mut self) -> Result<i8> {
        self.read_integer("i8")
    }

    fn read_i16(&mut self) -> Result<i16> {
        self.read_integer("i16")
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.read_integer("i32")
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.read_integer("i64")
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.read_integer("u8")
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.read_integer("u16")
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.read_integer("u32")
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.read_integer("u64")
    }

    /// Finite values past the `f32` range are a mismatch, not infinity.
    fn read_f32(&mut self) -> Result<f32> {
        match &self.slot {
            Slot::F32(v) => Ok(*v),
            Slot::Decimal(v) => parse_scalar::<f32>(&v.to_string(), "f32"),
            Slot::String(s) => {
                let narrow = parse_scalar::<f32>(s, "f32")?;
                if narrow.is_infinite() && parse_scalar::<f64>(s, "f32")?.is_finite() {
                    return Err(Error::mismatch("f32", BasicType::String));
                }
                Ok(narrow)
            }
            _ => {
                let wide = self.read_float("f32")?;
                let narrow = wide as f32;
                if wide.is_finite() && !narrow.is_finite() {
                    return Err(Error::mismatch("f32", self.tag()));
                }
                Ok(narrow)
            }
        }
    }

    fn read_f64(&mut self) -> Result<f64> {
        self.read_float("f64")
    }

    fn read_decimal(&mut self) -> Result<Decimal> {
        let found = self.tag();
        match &self.slot {
            Slot::Null => Ok(Decimal::ZERO),
            Slot::Decimal(v) => Ok(*v),
            Slot::F32(v) => decimal_from_f64(f64::from(*v), found),
            Slot::F64(v) => decimal_from_f64(*v, found),
            Slot::String(s) => decimal_from_str(s),
            _ => {
                let wide = self.read_integer::<i128>("decimal")?;
                Decimal::try_from_i128_with_scale(wide, 0)
                    .map_err(|_| Error::mismatch("decimal", found))
            }
        }
    }

    fn read_char(&mut self) -> Result<char> {
        match &self.slot {
            Slot::Char(c) => Ok(*c),
            Slot::String(s) => char_from_str(s),
            _ => Err(Error::mismatch("char", self.tag())),
        }
    }

    fn read_datetime(&mut self) -> Result<DateTime<FixedOffset>> {
        match &self.slot {
            Slot::DateTime(v) => Ok(*v),
            Slot::String(s) => datetime_from_str(s),
            _ => Err(Error::mismatch("datetime", self.tag())),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        Ok(match &self.slot {
            Slot::String(s) => s.clone(),
            Slot::Bool(v) => v.to_string(),
            Slot::I8(v) => v.to_string(),
            Slot::I16(v) => v.to_string(),
            Slot::I32(v) => v.to_string(),
            Slot::I64(v) => v.to_string(),
            Slot::U8(v) => v.to_string(),
            Slot::U16(v) => v.to_string(),
            Slot::U32(v) => v.to_string(),
            Slot::U64(v) => v.to_string(),
            Slot::F32(v) => v.to_string(),
            Slot::F64(v) => v.to_string(),
            Slot::Decimal(v) => v.to_string(),
            Slot::Char(c) => c.to_string(),
            Slot::DateTime(v) => v.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            _ => return Err(Error::mismatch("string", self.tag())),
        })
    }

    fn read_opaque(&mut self) -> Result<Opaque> {
        match &self.slot {
            Slot::Opaque(v) => Ok(v.clone()),
            _ => Err(Error::mismatch("opaque", self.tag())),
        }
    }

    fn read_array(&mut self, dest: &mut dyn SequenceWriter) -> Result<()> {
        match &self.slot {
            Slot::Array(reader) => reader.read_all(dest),
            _ => Err(Error::mismatch("array", self.tag())),
        }
    }

    fn read_object(&mut self, dest: &mut dyn MapWriter) -> Result<()> {
        match &self.slot {
            Slot::Object(reader) => reader.read_all(dest),
            _ => Err(Error::mismatch("object", self.tag())),
        }
    }

    fn skip(&mut self) -> Result<()> {
        Ok(())
    }

    fn identity(&self) -> Option<u64> {
        match &self.slot {
            Slot::Array(reader) => reader.identity(),
            Slot::Object(reader) => reader.identity(),
            _ => None,
        }
    }

    fn member_policy(&self) -> MemberPolicy {
        self.policy
    }

    fn targeted_id(&self) -> Option<u64> {
        self.targeted_id
    }

    fn write_to<'s>(&'s mut self, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        self.replay(dest)
    }
}

impl<'a> ValueWriter<'a> for ValueBuffer<'a> {
    fn write_null(&mut self) -> Result<()> {
        self.slot = Slot::Null;
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.slot = Slot::Bool(value);
        Ok(())
    }

    fn write_i8(&mut self, value: i8) -> Result<()> {
        self.slot = Slot::I8(value);
        Ok(())
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.slot = Slot::I16(value);
        Ok(())
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.slot = Slot::I32(value);
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.slot = Slot::I64(value);
        Ok(())
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.slot = Slot::U8(value);
        Ok(())
    }

    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.slot = Slot::U16(value);
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.slot = Slot::U32(value);
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.slot = Slot::U64(value);
        Ok(())
    }

    fn write_f32(&mut self, value: f32) -> Result<()> {
        self.slot = Slot::F32(value);
        Ok(())
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.slot = Slot::F64(value);
        Ok(())
    }

    fn write_decimal(&mut self, value: Decimal) -> Result<()> {
        self.slot = Slot::Decimal(value);
        Ok(())
    }

    fn write_char(&mut self, value: char) -> Result<()> {
        self.slot = Slot::Char(value);
        Ok(())
    }

    fn write_datetime(&mut self, value: DateTime<FixedOffset>) -> Result<()> {
        self.slot = Slot::DateTime(value);
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        // Reuse the allocation when restaging text.
        if let Slot::String(existing) = &mut self.slot {
            existing.clear();
            existing.push_str(value);
        } else {
            self.slot = Slot::String(value.to_owned());
        }
        Ok(())
    }

    fn write_opaque(&mut self, value: Opaque) -> Result<()> {
        self.slot = Slot::Opaque(value);
        Ok(())
    }

    fn write_array(&mut self, reader: Box<dyn SequenceReader + 'a>) -> Result<()> {
        self.slot = Slot::Array(reader);
        Ok(())
    }

    fn write_object(&mut self, reader: Box<dyn MapReader + 'a>) -> Result<()> {
        self.slot = Slot::Object(reader);
        Ok(())
    }

    fn member_policy(&self) -> MemberPolicy {
        self.policy
    }

    fn targeted_id(&self) -> Option<u64> {
        self.targeted_id
    }
}
