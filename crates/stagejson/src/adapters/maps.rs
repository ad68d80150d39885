// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Name-addressed containers.

use crate::contracts::{
    BasicType, ElementFilter, Key, MapReader, MapWriter, ValueReader, ValueWriter,
};
use crate::dispatch::{self, Value};
use crate::error::{Error, Result};
use crate::staging::ValueBuffer;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use uuid::Uuid;

/// Map keys: anything with a lossless text form.
pub trait MapKey: Sized {
    fn to_key(&self) -> Cow<'_, str>;
    fn from_key(key: &str) -> Result<Self>;
}

impl MapKey for String {
    fn to_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }

    fn from_key(key: &str) -> Result<Self> {
        Ok(key.to_owned())
    }
}

macro_rules! parsed_key {
    ($($ty:ty),*) => {
        $(
            impl MapKey for $ty {
                fn to_key(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }

                fn from_key(key: &str) -> Result<Self> {
                    key.trim()
                        .parse()
                        .map_err(|_| Error::mismatch(stringify!($ty), BasicType::String))
                }
            }
        )*
    };
}

parsed_key!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, char, bool, Uuid);

/// Map reader over borrowed entries, in the order given.
pub struct EntryReader<'a, V> {
    entries: Vec<(Cow<'a, str>, &'a V)>,
}

impl<'a, V: Value> EntryReader<'a, V> {
    pub fn new(entries: impl IntoIterator<Item = (Cow<'a, str>, &'a V)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    fn deliver(
        &self,
        dest: &mut dyn MapWriter,
        mut filter: Option<&mut ElementFilter<'_>>,
    ) -> Result<()> {
        dest.initialize(self.entries.len());
        for (name, value) in &self.entries {
            let mut staged = ValueBuffer::scoped(dest.member_policy(), dest.targeted_id());
            dispatch::write_value(*value, &mut staged)?;
            if let Some(filter) = filter.as_deref_mut() {
                if !filter(&Key::Name(Cow::Borrowed(name)), &staged) {
                    continue;
                }
            }
            dest.write_value(name, &mut staged)?;
        }
        Ok(())
    }
}

impl<V: Value> MapReader for EntryReader<'_, V> {
    fn count(&self) -> usize {
        self.entries.len()
    }

    fn keys(&self) -> Vec<Cow<'_, str>> {
        self.entries
            .iter()
            .map(|(name, _)| Cow::Borrowed(name.as_ref()))
            .collect()
    }

    fn read_value<'s>(&'s self, key: &str, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        match self.entries.iter().find(|(name, _)| name == key) {
            Some((_, value)) => dispatch::write_value(*value, dest),
            None => Err(Error::MissingMember {
                type_name: std::any::type_name::<V>(),
                member: key.to_owned(),
            }),
        }
    }

    fn read_all(&self, dest: &mut dyn MapWriter) -> Result<()> {
        self.deliver(dest, None)
    }

    fn read_all_filtered(
        &self,
        dest: &mut dyn MapWriter,
        filter: &mut ElementFilter<'_>,
    ) -> Result<()> {
        self.deliver(dest, Some(filter))
    }
}

/// Map writer collecting into any `Extend`-able map. Later duplicates win.
pub struct EntryWriter<K, V, M> {
    map: M,
    written: usize,
    _entry: std::marker::PhantomData<fn() -> (K, V)>,
}

impl<K, V, M: Default> Default for EntryWriter<K, V, M> {
    fn default() -> Self {
        Self {
            map: M::default(),
            written: 0,
            _entry: std::marker::PhantomData,
        }
    }
}

impl<K, V, M> EntryWriter<K, V, M> {
    pub fn into_inner(self) -> M {
        self.map
    }
}

impl<K: MapKey, V: Value, M: Extend<(K, V)>> MapWriter for EntryWriter<K, V, M> {
    fn initialize(&mut self, _capacity: usize) {}

    fn count(&self) -> usize {
        self.written
    }

    fn write_value(&mut self, key: &str, src: &mut dyn ValueReader) -> Result<()> {
        let key = K::from_key(key)?;
        let value = dispatch::read_value::<V>(src)?;
        self.map.extend(std::iter::once((key, value)));
        self.written += 1;
        Ok(())
    }
}

/// Emitted in key-text order so output does not depend on hash seeds.
impl<K, V> Value for HashMap<K, V>
where
    K: MapKey + Eq + Hash + 'static,
    V: Value,
{
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        let mut entries: Vec<_> = self.iter().map(|(k, v)| (k.to_key(), v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        writer.write_object(Box::new(EntryReader::new(entries)))
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        let mut entries = EntryWriter::<K, V, HashMap<K, V>>::default();
        reader.read_object(&mut entries)?;
        Ok(entries.into_inner())
    }
}

impl<K, V> Value for BTreeMap<K, V>
where
    K: MapKey + Ord + 'static,
    V: Value,
{
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        let entries = self.iter().map(|(k, v)| (k.to_key(), v));
        writer.write_object(Box::new(EntryReader::new(entries)))
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        let mut entries = EntryWriter::<K, V, BTreeMap<K, V>>::default();
        reader.read_object(&mut entries)?;
        Ok(entries.into_inner())
    }
}
