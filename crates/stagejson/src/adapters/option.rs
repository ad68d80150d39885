// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Nullable values.

use crate::contracts::{ValueReader, ValueWriter};
use crate::dispatch::{self, Value};
use crate::error::Result;

/// `None` is null; null (and, in JSON, `undefined`) reads back as `None`.
impl<T: Value> Value for Option<T> {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        match self {
            Some(value) => dispatch::write_value(value, writer),
            None => writer.write_null(),
        }
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        if reader.try_read_null()? {
            return Ok(None);
        }
        dispatch::read_value(reader).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::BasicType;
    use crate::staging::ValueBuffer;

    #[test]
    fn test_none_is_null() {
        let none: Option<String> = None;
        let mut buf = ValueBuffer::new();
        buf.write_i32(1).unwrap();
        none.write_value(&mut buf).unwrap();
        assert_eq!(buf.tag(), BasicType::Null);
        assert_eq!(Option::<String>::read_value(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_some_is_transparent() {
        let some = Some(7u16);
        let mut buf = ValueBuffer::new();
        some.write_value(&mut buf).unwrap();
        assert_eq!(buf.tag(), BasicType::U16);
        assert_eq!(Option::<u16>::read_value(&mut buf).unwrap(), Some(7));
    }
}
