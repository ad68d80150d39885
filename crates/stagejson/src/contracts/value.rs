// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive read/write contract for a single value.

use super::{BasicType, MapReader, MapWriter, MemberPolicy, Opaque, SequenceReader, SequenceWriter};
use crate::adapters::dynamic::{DynamicMap, DynamicSequence};
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Source of exactly one value.
///
/// Typed reads convert from the underlying tag when a conversion is defined
/// (numeric to numeric, numeric to bool, string to scalar) and fail with
/// `Error::TypeMismatch` otherwise.
pub trait ValueReader {
    /// Tag of the pending value. Does not consume it.
    fn basic_type(&mut self) -> Result<BasicType>;

    /// Consume the pending value if it is null; leave it untouched otherwise.
    fn try_read_null(&mut self) -> Result<bool>;

    fn read_bool(&mut self) -> Result<bool>;
    fn read_i8(&mut self) -> Result<i8>;
    fn read_i16(&mut self) -> Result<i16>;
    fn read_i32(&mut self) -> Result<i32>;
    fn read_i64(&mut self) -> Result<i64>;
    fn read_u8(&mut self) -> Result<u8>;
    fn read_u16(&mut self) -> Result<u16>;
    fn read_u32(&mut self) -> Result<u32>;
    fn read_u64(&mut self) -> Result<u64>;
    fn read_f32(&mut self) -> Result<f32>;
    fn read_f64(&mut self) -> Result<f64>;
    fn read_decimal(&mut self) -> Result<Decimal>;
    fn read_char(&mut self) -> Result<char>;
    fn read_datetime(&mut self) -> Result<DateTime<FixedOffset>>;
    fn read_string(&mut self) -> Result<String>;

    /// Guids travel as hyphenated strings unless the reader knows better.
    fn read_guid(&mut self) -> Result<Uuid> {
        let text = self.read_string()?;
        Uuid::parse_str(text.trim()).map_err(|_| Error::mismatch("guid", BasicType::String))
    }

    fn read_opaque(&mut self) -> Result<Opaque>;

    /// Feed every element of the pending array into `dest`.
    fn read_array(&mut self, dest: &mut dyn SequenceWriter) -> Result<()>;

    /// Feed every member of the pending object into `dest`.
    fn read_object(&mut self, dest: &mut dyn MapWriter) -> Result<()>;

    /// Discard the pending value.
    fn skip(&mut self) -> Result<()>;

    /// Identity of the pending structure, when the source tracks one.
    fn identity(&self) -> Option<u64> {
        None
    }

    fn member_policy(&self) -> MemberPolicy {
        MemberPolicy::LENIENT
    }

    /// Id under which targeted strategy overrides are looked up.
    fn targeted_id(&self) -> Option<u64> {
        None
    }

    /// Replay the pending value into `dest`.
    ///
    /// The default transcodes tag by tag; structures are materialized into
    /// owned dynamic readers first. Staged sources override this to hand their
    /// structural readers over without copying.
    fn write_to<'s>(&'s mut self, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        match self.basic_type()? {
            BasicType::Null => {
                self.try_read_null()?;
                dest.write_null()
            }
            BasicType::Bool => dest.write_bool(self.read_bool()?),
            BasicType::I8 => dest.write_i8(self.read_i8()?),
            BasicType::I16 => dest.write_i16(self.read_i16()?),
            BasicType::I32 => dest.write_i32(self.read_i32()?),
            BasicType::I64 => dest.write_i64(self.read_i64()?),
            BasicType::U8 => dest.write_u8(self.read_u8()?),
            BasicType::U16 => dest.write_u16(self.read_u16()?),
            BasicType::U32 => dest.write_u32(self.read_u32()?),
            BasicType::U64 => dest.write_u64(self.read_u64()?),
            BasicType::F32 => dest.write_f32(self.read_f32()?),
            BasicType::F64 => dest.write_f64(self.read_f64()?),
            BasicType::Decimal => dest.write_decimal(self.read_decimal()?),
            BasicType::Char => dest.write_char(self.read_char()?),
            BasicType::DateTime => dest.write_datetime(self.read_datetime()?),
            BasicType::String => {
                let text = self.read_string()?;
                dest.write_string(&text)
            }
            BasicType::Opaque => dest.write_opaque(self.read_opaque()?),
            BasicType::Array => {
                let mut items = DynamicSequence::default();
                self.read_array(&mut items)?;
                dest.write_array(Box::new(items))
            }
            BasicType::Object => {
                let mut entries = DynamicMap::default();
                self.read_object(&mut entries)?;
                dest.write_object(Box::new(entries))
            }
        }
    }
}

/// Sink for exactly one value.
///
/// `'a` bounds the structural readers handed to `write_array` and
/// `write_object`; sinks that store them (the staging buffer) keep them for
/// that long, sinks that consume them (codecs) walk them immediately.
pub trait ValueWriter<'a> {
    fn write_null(&mut self) -> Result<()>;
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_i8(&mut self, value: i8) -> Result<()>;
    fn write_i16(&mut self, value: i16) -> Result<()>;
    fn write_i32(&mut self, value: i32) -> Result<()>;
    fn write_i64(&mut self, value: i64) -> Result<()>;
    fn write_u8(&mut self, value: u8) -> Result<()>;
    fn write_u16(&mut self, value: u16) -> Result<()>;
    fn write_u32(&mut self, value: u32) -> Result<()>;
    fn write_u64(&mut self, value: u64) -> Result<()>;
    fn write_f32(&mut self, value: f32) -> Result<()>;
    fn write_f64(&mut self, value: f64) -> Result<()>;
    fn write_decimal(&mut self, value: Decimal) -> Result<()>;
    fn write_char(&mut self, value: char) -> Result<()>;
    fn write_datetime(&mut self, value: DateTime<FixedOffset>) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()>;

    fn write_guid(&mut self, value: Uuid) -> Result<()> {
        let mut buf = Uuid::encode_buffer();
        let text = value.hyphenated().encode_lower(&mut buf);
        self.write_string(text)
    }

    fn write_opaque(&mut self, value: Opaque) -> Result<()>;
    fn write_array(&mut self, reader: Box<dyn SequenceReader + 'a>) -> Result<()>;
    fn write_object(&mut self, reader: Box<dyn MapReader + 'a>) -> Result<()>;

    fn member_policy(&self) -> MemberPolicy {
        MemberPolicy::LENIENT
    }

    /// Id under which targeted strategy overrides are looked up.
    fn targeted_id(&self) -> Option<u64> {
        None
    }
}
