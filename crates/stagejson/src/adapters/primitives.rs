// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalars: one read/write pair each.

use crate::contracts::{BasicType, ValueReader, ValueWriter};
use crate::dispatch::Value;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

macro_rules! scalar_value {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            impl Value for $ty {
                fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
                    writer.$write(*self)
                }

                fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
                    reader.$read()
                }
            }
        )*
    };
}

scalar_value! {
    bool => read_bool, write_bool;
    i8 => read_i8, write_i8;
    i16 => read_i16, write_i16;
    i32 => read_i32, write_i32;
    i64 => read_i64, write_i64;
    u8 => read_u8, write_u8;
    u16 => read_u16, write_u16;
    u32 => read_u32, write_u32;
    u64 => read_u64, write_u64;
    f32 => read_f32, write_f32;
    f64 => read_f64, write_f64;
    char => read_char, write_char;
    Decimal => read_decimal, write_decimal;
    DateTime<FixedOffset> => read_datetime, write_datetime;
    Uuid => read_guid, write_guid;
}

impl Value for isize {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_i64(*self as i64)
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        let wide = reader.read_i64()?;
        isize::try_from(wide).map_err(|_| Error::mismatch("isize", BasicType::I64))
    }
}

impl Value for usize {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_u64(*self as u64)
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        let wide = reader.read_u64()?;
        usize::try_from(wide).map_err(|_| Error::mismatch("usize", BasicType::U64))
    }
}

impl Value for String {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_string(self)
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        reader.read_string()
    }
}

impl Value for DateTime<Utc> {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_datetime(self.fixed_offset())
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        Ok(reader.read_datetime()?.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::ValueBuffer;

    fn round_trip<T: Value + PartialEq + std::fmt::Debug>(value: T) {
        let mut buf = ValueBuffer::new();
        value.write_value(&mut buf).unwrap();
        assert_eq!(T::read_value(&mut buf).unwrap(), value);
    }

    #[test]
    fn test_scalars_round_trip() {
        round_trip(true);
        round_trip(-5i8);
        round_trip(i16::MIN);
        round_trip(i32::MAX);
        round_trip(i64::MIN);
        round_trip(u8::MAX);
        round_trip(u64::MAX);
        round_trip(1.5f32);
        round_trip(-2.25f64);
        round_trip('λ');
        round_trip(Decimal::new(314, 2));
        round_trip(String::from("text"));
        round_trip(usize::MAX);
        round_trip(-3isize);
        round_trip(Uuid::from_u128(0x1234_5678_9abc_def0_1234_5678_9abc_def0));
        round_trip(Utc::now());
    }

    #[test]
    fn test_guid_travels_as_string() {
        let id = Uuid::nil();
        let mut buf = ValueBuffer::new();
        id.write_value(&mut buf).unwrap();
        assert_eq!(buf.as_str(), Some("00000000-0000-0000-0000-000000000000"));
    }
}
