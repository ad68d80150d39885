// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pass-through values.

use crate::contracts::{BasicType, Opaque, RawJson, ValueReader, ValueWriter};
use crate::dispatch::Value;
use crate::error::{Error, Result};

impl Value for Opaque {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_opaque(self.clone())
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        reader.read_opaque()
    }
}

/// Spliced verbatim on encode; captured verbatim on decode.
impl Value for RawJson {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_opaque(Opaque::new(self.clone()))
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        let opaque = reader.read_opaque()?;
        opaque
            .downcast_ref::<RawJson>()
            .cloned()
            .ok_or(Error::mismatch("raw json", BasicType::Opaque))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::ValueBuffer;

    #[test]
    fn test_raw_json_is_staged_as_opaque() {
        let raw = RawJson("{\"a\":[1,2]}".into());
        let mut buf = ValueBuffer::new();
        raw.write_value(&mut buf).unwrap();
        assert_eq!(buf.tag(), BasicType::Opaque);
        assert_eq!(RawJson::read_value(&mut buf).unwrap(), raw);
    }

    #[test]
    fn test_foreign_opaque_is_not_raw_json() {
        let mut buf = ValueBuffer::new();
        buf.write_opaque(Opaque::new(3u8)).unwrap();
        assert!(matches!(
            RawJson::read_value(&mut buf),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(Opaque::read_value(&mut buf).is_ok());
    }
}
