// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Capability contracts.
//!
//! Everything that produces or consumes a value talks through these traits:
//!
//! - [`ValueReader`] / [`ValueWriter`]: one value, one read or write per basic tag
//! - [`SequenceReader`] / [`SequenceWriter`]: index-addressed structures
//! - [`MapReader`] / [`MapWriter`]: name-addressed structures
//!
//! Codecs implement the value traits, containers and objects implement the
//! structural ones, and the staging buffer sits in between.

mod convert;
mod opaque;
mod structure;
mod value;

pub(crate) use convert::{
    bool_from_str, char_from_str, datetime_from_str, decimal_from_f64, decimal_from_str,
    decimal_to_integer, f64_to_integer, parse_scalar,
};
pub use opaque::{Opaque, RawJson};
pub use structure::{
    ElementFilter, Key, MapReader, MapWriter, SequenceReader, SequenceWriter, Shared,
};
pub use value::{ValueReader, ValueWriter};

use std::fmt;

/// Closed set of kinds a staged value can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    Null,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    Char,
    DateTime,
    String,
    Array,
    Object,
    /// Pass-through value the codecs do not interpret.
    Opaque,
}

impl BasicType {
    /// Integer, floating point or decimal.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::F32
                | Self::F64
                | Self::Decimal
        )
    }

    /// Array or object.
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Decimal => "decimal",
            Self::Char => "char",
            Self::DateTime => "datetime",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Opaque => "opaque",
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How object adapters treat unknown keys and inaccessible members.
///
/// Lenient (the default) skips them; strict raises `MissingMember` /
/// `Access`. Codecs expose their policy through `member_policy()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberPolicy {
    /// Unknown keys raise `Error::MissingMember`.
    pub strict_members: bool,
    /// Members without read/write access raise `Error::Access`.
    pub strict_access: bool,
}

impl MemberPolicy {
    pub const LENIENT: Self = Self {
        strict_members: false,
        strict_access: false,
    };

    pub const STRICT: Self = Self {
        strict_members: true,
        strict_access: true,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_classification() {
        assert!(BasicType::U8.is_numeric());
        assert!(BasicType::Decimal.is_numeric());
        assert!(!BasicType::Bool.is_numeric());
        assert!(!BasicType::Char.is_numeric());
        assert!(BasicType::Object.is_structural());
        assert!(!BasicType::String.is_structural());
    }

    #[test]
    fn test_default_policy_is_lenient() {
        assert_eq!(MemberPolicy::default(), MemberPolicy::LENIENT);
    }
}
