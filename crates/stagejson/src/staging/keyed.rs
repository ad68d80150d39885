// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Staging buffer bound to a slot of a structure under construction.

use super::ValueBuffer;
use crate::contracts::{
    BasicType, Key, MapReader, MapWriter, MemberPolicy, Opaque, SequenceReader, SequenceWriter,
    ValueReader, ValueWriter,
};
use crate::error::Result;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use std::borrow::Cow;

enum Target<'w> {
    Member(&'w mut dyn MapWriter, Cow<'w, str>),
    Element(&'w mut dyn SequenceWriter, usize),
}

/// A [`ValueBuffer`] that knows where it belongs.
///
/// Producers write into it exactly as they would into a free value;
/// [`commit`](Self::commit) then delivers the staged value to the bound
/// container through its `write_value`.
pub struct KeyedBuffer<'w, 'a> {
    buffer: ValueBuffer<'a>,
    target: Target<'w>,
}

impl<'w, 'a> KeyedBuffer<'w, 'a> {
    /// Bind to member `name` of `dest`.
    pub fn member(dest: &'w mut dyn MapWriter, name: impl Into<Cow<'w, str>>) -> Self {
        let buffer = ValueBuffer::scoped(dest.member_policy(), dest.targeted_id());
        Self {
            buffer,
            target: Target::Member(dest, name.into()),
        }
    }

    /// Bind to element `index` of `dest`.
    pub fn element(dest: &'w mut dyn SequenceWriter, index: usize) -> Self {
        let buffer = ValueBuffer::scoped(dest.member_policy(), dest.targeted_id());
        Self {
            buffer,
            target: Target::Element(dest, index),
        }
    }

    pub fn key(&self) -> Key<'_> {
        match &self.target {
            Target::Member(_, name) => Key::Name(Cow::Borrowed(name)),
            Target::Element(_, index) => Key::Index(*index),
        }
    }

    pub fn buffer(&self) -> &ValueBuffer<'a> {
        &self.buffer
    }

    /// Deliver the staged value to the bound slot.
    pub fn commit(self) -> Result<()> {
        let KeyedBuffer { mut buffer, target } = self;
        match target {
            Target::Member(dest, name) => dest.write_value(&name, &mut buffer),
            Target::Element(dest, index) => dest.write_value(index, &mut buffer),
        }
    }
}

macro_rules! forward_reads {
    ($($name:ident -> $ty:ty;)*) => {
        $(
            fn $name(&mut self) -> Result<$ty> {
                self.buffer.$name()
            }
        )*
    };
}

macro_rules! forward_writes {
    ($($name:ident($ty:ty);)*) => {
        $(
            fn $name(&mut self, value: $ty) -> Result<()> {
                self.buffer.$name(value)
            }
        )*
    };
}

impl ValueReader for KeyedBuffer<'_, '_> {
    forward_reads! {
        basic_type -> BasicType;
        try_read_null -> bool;
        read_bool -> bool;
        read_i8 -> i8;
        read_i16 -> i16;
        read_i32 -> i32;
        read_i64 -> i64;
        read_u8 -> u8;
        read_u16 -> u16;
        read_u32 -> u32;
        read_u64 -> u64;
        read_f32 -> f32;
        read_f64 -> f64;
        read_decimal -> Decimal;
        read_char -> char;
        read_datetime -> DateTime<FixedOffset>;
        read_string -> String;
        read_opaque -> Opaque;
        skip -> ();
    }

    fn read_array(&mut self, dest: &mut dyn SequenceWriter) -> Result<()> {
        self.buffer.read_array(dest)
    }

    fn read_object(&mut self, dest: &mut dyn MapWriter) -> Result<()> {
        self.buffer.read_object(dest)
    }

    fn identity(&self) -> Option<u64> {
        ValueReader::identity(&self.buffer)
    }

    fn member_policy(&self) -> MemberPolicy {
        ValueReader::member_policy(&self.buffer)
    }

    fn targeted_id(&self) -> Option<u64> {
        ValueReader::targeted_id(&self.buffer)
    }

    fn write_to<'s>(&'s mut self, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        self.buffer.replay(dest)
    }
}

impl<'a> ValueWriter<'a> for KeyedBuffer<'_, 'a> {
    forward_writes! {
        write_bool(bool);
        write_i8(i8);
        write_i16(i16);
        write_i32(i32);
        write_i64(i64);
        write_u8(u8);
        write_u16(u16);
        write_u32(u32);
        write_u64(u64);
        write_f32(f32);
        write_f64(f64);
        write_decimal(Decimal);
        write_char(char);
        write_datetime(DateTime<FixedOffset>);
        write_string(&str);
        write_opaque(Opaque);
        write_array(Box<dyn SequenceReader + 'a>);
        write_object(Box<dyn MapReader + 'a>);
    }

    fn write_null(&mut self) -> Result<()> {
        self.buffer.write_null()
    }

    fn member_policy(&self) -> MemberPolicy {
        ValueWriter::member_policy(&self.buffer)
    }

    fn targeted_id(&self) -> Option<u64> {
        ValueWriter::targeted_id(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dynamic::{DynamicMap, DynamicSequence, DynamicValue};

    #[test]
    fn test_member_commit() {
        let mut map = DynamicMap::default();
        let mut slot = KeyedBuffer::member(&mut map, "answer");
        assert_eq!(slot.key(), Key::Name("answer".into()));
        slot.write_i32(42).unwrap();
        slot.commit().unwrap();
        assert_eq!(
            map.into_inner(),
            vec![("answer".to_string(), DynamicValue::I64(42))]
        );
    }

    #[test]
    fn test_element_commit_appends() {
        let mut seq = DynamicSequence::default();
        for (index, text) in ["a", "b"].iter().enumerate() {
            let mut slot = KeyedBuffer::element(&mut seq, index);
            slot.write_string(text).unwrap();
            assert_eq!(slot.buffer().as_str(), Some(*text));
            slot.commit().unwrap();
        }
        assert_eq!(
            seq.into_inner(),
            vec![DynamicValue::from("a"), DynamicValue::from("b")]
        );
    }

    #[test]
    fn test_reads_see_staged_value() {
        let mut seq = DynamicSequence::default();
        let mut slot = KeyedBuffer::element(&mut seq, 0);
        slot.write_f64(1.5).unwrap();
        assert_eq!(slot.basic_type().unwrap(), BasicType::F64);
        assert_eq!(slot.read_string().unwrap(), "1.5");
    }
}
