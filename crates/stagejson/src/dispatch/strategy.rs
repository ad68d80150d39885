// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Strategies: the (read, write) function pairs the registry hands out.

use super::{Registry, Value};
use crate::contracts::{ValueReader, ValueWriter};
use crate::error::{Error, Result};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub type ReadFn<T> = fn(&mut dyn ValueReader) -> Result<T>;
pub type WriteFn<T> = for<'a> fn(&'a T, &mut dyn ValueWriter<'a>) -> Result<()>;

/// Stateless read/write pair for `T`.
pub struct Strategy<T: 'static> {
    pub read: ReadFn<T>,
    pub write: WriteFn<T>,
}

impl<T: 'static> Clone for Strategy<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> Copy for Strategy<T> {}

impl<T: 'static> Strategy<T> {
    pub fn new(read: ReadFn<T>, write: WriteFn<T>) -> Self {
        Self { read, write }
    }
}

impl<T: Value> Strategy<T> {
    /// The strategy `T`'s own [`Value`] impl provides.
    pub fn native() -> Self {
        Self {
            read: T::read_value,
            write: T::write_value,
        }
    }
}

impl<T: fmt::Display + FromStr + 'static> Strategy<T> {
    /// Round-trip through the type's text form.
    pub fn text() -> Self {
        Self {
            read: read_text::<T>,
            write: write_text::<T>,
        }
    }
}

pub(crate) fn read_text<T: FromStr>(reader: &mut dyn ValueReader) -> Result<T> {
    let text = reader.read_string()?;
    text.trim().parse::<T>().map_err(|_| {
        Error::unsupported(
            std::any::type_name::<T>(),
            format!("cannot parse {:?}", text),
        )
    })
}

pub(crate) fn write_text<'a, T: fmt::Display>(value: &'a T, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
    writer.write_string(&value.to_string())
}

/// Runtime name of a [`Value`] type.
///
/// Carries the type's native strategy constructor so a key alone is enough
/// to resolve a strategy (runtime-typed decoding).
#[derive(Clone, Copy)]
pub struct TypeKey {
    pub id: TypeId,
    pub name: &'static str,
    native: fn() -> ErasedStrategy,
}

impl TypeKey {
    pub fn of<T: Value>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            native: || ErasedStrategy::new(Strategy::<T>::native()),
        }
    }

    pub(crate) fn native_strategy(&self) -> ErasedStrategy {
        (self.native)()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Type-erased view of a [`Strategy`].
pub trait AnyStrategy: Send + Sync {
    fn type_key(&self) -> TypeKey;

    fn as_any(&self) -> &dyn Any;

    /// Read one value of the strategy's type, boxed.
    fn read_boxed(&self, reader: &mut dyn ValueReader) -> Result<Box<dyn Any>>;

    /// Write `value`, which must be of the strategy's type.
    fn write_any<'a>(&self, value: &'a dyn Any, writer: &mut dyn ValueWriter<'a>) -> Result<()>;
}

struct Typed<T: 'static>(Strategy<T>);

impl<T: Value> AnyStrategy for Typed<T> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn read_boxed(&self, reader: &mut dyn ValueReader) -> Result<Box<dyn Any>> {
        Ok(Box::new((self.0.read)(reader)?))
    }

    fn write_any<'a>(&self, value: &'a dyn Any, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        match value.downcast_ref::<T>() {
            Some(typed) => (self.0.write)(typed, writer),
            None => Err(Error::unsupported(
                std::any::type_name::<T>(),
                "value is of a different type",
            )),
        }
    }
}

/// Owned, type-erased strategy as stored in the registry.
pub struct ErasedStrategy(Box<dyn AnyStrategy>);

impl ErasedStrategy {
    pub fn new<T: Value>(strategy: Strategy<T>) -> Self {
        Self(Box::new(Typed(strategy)))
    }

    pub fn type_key(&self) -> TypeKey {
        self.0.type_key()
    }

    /// Typed strategy, if this entry was built for `T`.
    pub fn typed<T: Value>(&self) -> Option<Strategy<T>> {
        self.0
            .as_any()
            .downcast_ref::<Typed<T>>()
            .map(|typed| typed.0)
    }

    pub fn read_boxed(&self, reader: &mut dyn ValueReader) -> Result<Box<dyn Any>> {
        self.0.read_boxed(reader)
    }

    pub fn write_any<'a>(&self, value: &'a dyn Any, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        self.0.write_any(value, writer)
    }
}

impl fmt::Debug for ErasedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErasedStrategy({})", self.type_key().name)
    }
}

/// User hook consulted before a type's own [`Value`] impl.
///
/// Returning `None` passes the type on to the next matcher. Matchers may
/// take [`StrategyHandle`](super::StrategyHandle)s from `registry`
/// (including to the type being resolved) but must not resolve the type
/// being resolved eagerly.
pub trait StrategyMatcher: Send + Sync {
    fn try_make(&self, key: TypeKey, registry: &Registry) -> Option<ErasedStrategy>;
}

impl<F> StrategyMatcher for F
where
    F: Fn(TypeKey, &Registry) -> Option<ErasedStrategy> + Send + Sync,
{
    fn try_make(&self, key: TypeKey, registry: &Registry) -> Option<ErasedStrategy> {
        self(key, registry)
    }
}

/// Matcher for exactly one type.
pub(crate) struct ExactMatcher<T: 'static>(pub(crate) Strategy<T>);

impl<T: Value> StrategyMatcher for ExactMatcher<T> {
    fn try_make(&self, key: TypeKey, _registry: &Registry) -> Option<ErasedStrategy> {
        (key.id == TypeId::of::<T>()).then(|| ErasedStrategy::new(self.0))
    }
}
