// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type dispatch.
//!
//! Every typed hop goes through [`write_value`] / [`read_value`], which pick
//! the strategy for `T` in this order:
//!
//! 1. a targeted override for the active reader/writer's id
//! 2. a user matcher registered with the [`Registry`]
//! 3. `T`'s own [`Value`] impl (containers, scalars, `#[derive(Value)]`)
//!
//! The choice for (2)/(3) is made once per type and cached.

mod overrides;
mod registry;
mod strategy;

pub use registry::{Registry, StrategyHandle};
pub use strategy::{
    AnyStrategy, ErasedStrategy, ReadFn, Strategy, StrategyMatcher, TypeKey, WriteFn,
};
pub(crate) use strategy::{read_text, write_text};

use crate::contracts::{MapWriter, SequenceWriter, ValueReader, ValueWriter};
use crate::error::Result;
use crate::staging::KeyedBuffer;

/// A type that can be written to and read from the value contracts.
///
/// Implemented for scalars, std containers, `chrono`/`uuid`/`rust_decimal`
/// types and, through `#[derive(Value)]`, for plain structs.
pub trait Value: Sized + 'static {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()>;

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self>;
}

/// Write `value` with the strategy currently chosen for `T`.
pub fn write_value<'a, T: Value>(value: &'a T, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
    let registry = Registry::global();
    if let Some(id) = writer.targeted_id() {
        if let Some(strategy) = registry.targeted::<T>(id) {
            return (strategy.write)(value, writer);
        }
    }
    (registry.resolve::<T>()?.write)(value, writer)
}

/// Read a `T` with the strategy currently chosen for `T`.
pub fn read_value<T: Value>(reader: &mut dyn ValueReader) -> Result<T> {
    let registry = Registry::global();
    if let Some(id) = reader.targeted_id() {
        if let Some(strategy) = registry.targeted::<T>(id) {
            return (strategy.read)(reader);
        }
    }
    (registry.resolve::<T>()?.read)(reader)
}

/// Stage `value` and deliver it as member `name` of `dest`.
pub fn write_member<T: Value>(dest: &mut dyn MapWriter, name: &str, value: &T) -> Result<()> {
    let mut slot = KeyedBuffer::member(dest, name);
    write_value(value, &mut slot)?;
    slot.commit()
}

/// Stage `value` and deliver it as element `index` of `dest`.
pub fn write_element<T: Value>(dest: &mut dyn SequenceWriter, index: usize, value: &T) -> Result<()> {
    let mut slot = KeyedBuffer::element(dest, index);
    write_value(value, &mut slot)?;
    slot.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dynamic::{DynamicMap, DynamicSequence, DynamicValue};
    use crate::staging::ValueBuffer;

    #[test]
    fn test_write_member_and_element() {
        let mut map = DynamicMap::default();
        write_member(&mut map, "n", &3u8).unwrap();
        write_member(&mut map, "tags", &vec!["a".to_string()]).unwrap();
        assert_eq!(
            map.into_inner(),
            vec![
                ("n".to_string(), DynamicValue::U64(3)),
                (
                    "tags".to_string(),
                    DynamicValue::Array(vec![DynamicValue::from("a")])
                ),
            ]
        );

        let mut seq = DynamicSequence::default();
        write_element(&mut seq, 0, &true).unwrap();
        write_element(&mut seq, 1, &Option::<i32>::None).unwrap();
        assert_eq!(
            seq.into_inner(),
            vec![DynamicValue::Bool(true), DynamicValue::Null]
        );
    }

    fn write_twice<'a>(value: &'a u32, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_u32(value * 2)
    }

    #[test]
    fn test_targeted_override_shadows_global() {
        const ID: u64 = 0xD15_7A7C;
        Registry::global().register_targeted::<u32>(ID, Strategy::new(u32::read_value, write_twice));

        let mut plain = ValueBuffer::new();
        write_value(&21u32, &mut plain).unwrap();
        assert_eq!(plain.read_u32().unwrap(), 21);

        let mut scoped = ValueBuffer::scoped(Default::default(), Some(ID));
        write_value(&21u32, &mut scoped).unwrap();
        assert_eq!(scoped.read_u32().unwrap(), 42);

        Registry::global().remove_targeted(ID);
        write_value(&21u32, &mut scoped).unwrap();
        assert_eq!(scoped.read_u32().unwrap(), 21);
    }
}
