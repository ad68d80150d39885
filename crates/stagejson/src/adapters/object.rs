// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Default structural binding for plain structs.
//!
//! A type describes itself as an ordered list of [`Member`]s (normally
//! generated by `#[derive(Value)]`); [`ObjectReader`] and [`ObjectWriter`]
//! turn that list into the map contracts.

use crate::contracts::{ElementFilter, Key, MapReader, MapWriter, ValueReader, ValueWriter};
use crate::dispatch::{TypeKey, WriteFn};
use crate::error::{AccessKind, Error, Result};
use crate::staging::ValueBuffer;
use std::borrow::Cow;
use std::fmt;

/// One accessible member of `T`.
pub struct Member<T: 'static> {
    pub name: &'static str,
    /// Declared type of the member.
    pub type_key: fn() -> TypeKey,
    pub can_read: bool,
    pub can_write: bool,
    /// Ordering key; `members()` is already sorted by it.
    pub order: i32,
    pub get: WriteFn<T>,
    pub set: fn(&mut T, &mut dyn ValueReader) -> Result<()>,
}

impl<T> fmt::Debug for Member<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("type", &(self.type_key)().name)
            .field("can_read", &self.can_read)
            .field("can_write", &self.can_write)
            .field("order", &self.order)
            .finish()
    }
}

/// Member-list contract.
pub trait Object: Sized + 'static {
    /// Members in emission order.
    fn members() -> &'static [Member<Self>];

    fn member(name: &str) -> Option<&'static Member<Self>> {
        Self::members().iter().find(|m| m.name == name)
    }
}

fn type_name<T>() -> &'static str {
    std::any::type_name::<T>()
}

/// Encode side: exposes an instance's readable members.
pub struct ObjectReader<'a, T> {
    target: &'a T,
}

impl<'a, T: Object> ObjectReader<'a, T> {
    pub fn new(target: &'a T) -> Self {
        Self { target }
    }

    fn deliver(
        &self,
        dest: &mut dyn MapWriter,
        mut filter: Option<&mut ElementFilter<'_>>,
    ) -> Result<()> {
        let policy = dest.member_policy();
        dest.initialize(MapReader::count(self));
        for member in T::members() {
            if !member.can_read {
                if policy.strict_access {
                    return Err(Error::Access {
                        type_name: type_name::<T>(),
                        member: member.name,
                        access: AccessKind::Read,
                    });
                }
                continue;
            }
            let mut staged = ValueBuffer::scoped(policy, dest.targeted_id());
            (member.get)(self.target, &mut staged)?;
            if let Some(filter) = filter.as_deref_mut() {
                if !filter(&Key::Name(Cow::Borrowed(member.name)), &staged) {
                    continue;
                }
            }
            dest.write_value(member.name, &mut staged)?;
        }
        Ok(())
    }
}

impl<T: Object> MapReader for ObjectReader<'_, T> {
    fn count(&self) -> usize {
        T::members().iter().filter(|m| m.can_read).count()
    }

    fn keys(&self) -> Vec<Cow<'_, str>> {
        T::members()
            .iter()
            .filter(|m| m.can_read)
            .map(|m| Cow::Borrowed(m.name))
            .collect()
    }

    fn read_value<'s>(&'s self, key: &str, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        let member = T::member(key).ok_or_else(|| Error::MissingMember {
            type_name: type_name::<T>(),
            member: key.to_owned(),
        })?;
        if !member.can_read {
            if dest.member_policy().strict_access {
                return Err(Error::Access {
                    type_name: type_name::<T>(),
                    member: member.name,
                    access: AccessKind::Read,
                });
            }
            return dest.write_null();
        }
        (member.get)(self.target, dest)
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

/// Decode side: assigns members of an instance by name.
///
/// Unknown keys and read-only members are skipped unless the source's
/// member policy is strict.
pub struct ObjectWriter<'a, T> {
    target: &'a mut T,
    written: usize,
}

impl<'a, T: Object> ObjectWriter<'a, T> {
    pub fn new(target: &'a mut T) -> Self {
        Self { target, written: 0 }
    }
}

impl<T: Object> MapWriter for ObjectWriter<'_, T> {
    fn initialize(&mut self, _capacity: usize) {}

    fn count(&self) -> usize {
        self.written
    }

    fn keys(&self) -> Vec<Cow<'_, str>> {
        T::members()
            .iter()
            .filter(|m| m.can_write)
            .map(|m| Cow::Borrowed(m.name))
            .collect()
    }

    fn write_value(&mut self, key: &str, src: &mut dyn ValueReader) -> Result<()> {
        let policy = src.member_policy();
        let Some(member) = T::member(key) else {
            if policy.strict_members {
                return Err(Error::MissingMember {
                    type_name: type_name::<T>(),
                    member: key.to_owned(),
                });
            }
            log::trace!("[object] skipping unknown member {}.{}", type_name::<T>(), key);
            return src.skip();
        };
        if !member.can_write {
            if policy.strict_access {
                return Err(Error::Access {
                    type_name: type_name::<T>(),
                    member: member.name,
                    access: AccessKind::Write,
                });
            }
            return src.skip();
        }
        (member.set)(self.target, src)?;
        self.written += 1;
        Ok(())
    }
}

/// Write `value` as an object through its member list.
pub fn write_object<'a, T: Object>(value: &'a T, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
    writer.write_object(Box::new(ObjectReader::new(value)))
}

/// Read a `T` member by member, starting from `T::default()`.
pub fn read_object<T: Object + Default>(reader: &mut dyn ValueReader) -> Result<T> {
    let mut value = T::default();
    reader.read_object(&mut ObjectWriter::new(&mut value))?;
    Ok(value)
}

/// Stage member `name` of `value` into a buffer that owns its structures.
pub(crate) fn stage_member<T: Object>(
    value: &T,
    name: &str,
    dest: &mut dyn ValueWriter<'_>,
) -> Result<()> {
    let reader = ObjectReader::new(value);
    let mut staged = ValueBuffer::scoped(dest.member_policy(), dest.targeted_id());
    reader.read_value(name, &mut staged)?;
    staged.replay_owned(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dynamic::{DynamicMap, DynamicValue};
    use crate::contracts::MemberPolicy;
    use crate::Value;

    #[derive(Debug, Default, PartialEq, Value)]
    struct Point {
        x: i32,
        #[value(rename = "Y")]
        y: i32,
        #[value(read_only)]
        id: u32,
        #[value(write_only)]
        secret: String,
    }

    fn point() -> Point {
        Point {
            x: 1,
            y: 2,
            id: 7,
            secret: "s".into(),
        }
    }

    #[test]
    fn test_members_in_order() {
        let names: Vec<_> = Point::members().iter().map(|m| m.name).collect();
        assert_eq!(names, ["x", "Y", "id", "secret"]);
        assert_eq!((Point::members()[0].type_key)(), TypeKey::of::<i32>());
    }

    #[test]
    fn test_reader_skips_unreadable_members() {
        let p = point();
        let reader = ObjectReader::new(&p);
        assert_eq!(reader.keys(), vec!["x", "Y", "id"]);

        let mut out = DynamicMap::default();
        reader.read_all(&mut out).unwrap();
        assert_eq!(out.into_inner().len(), 3);
    }

    #[test]
    fn test_writer_skips_read_only_and_unknown() {
        let mut p = Point::default();
        let mut writer = ObjectWriter::new(&mut p);
        let mut buf = ValueBuffer::new();
        buf.write_i32(5).unwrap();
        writer.write_value("x", &mut buf).unwrap();
        writer.write_value("id", &mut buf).unwrap();
        writer.write_value("nope", &mut buf).unwrap();
        assert_eq!(writer.count(), 1);
        assert_eq!(p.x, 5);
        assert_eq!(p.id, 0);
    }

    #[test]
    fn test_strict_policy_raises() {
        let mut p = Point::default();
        let mut writer = ObjectWriter::new(&mut p);
        let mut buf = ValueBuffer::scoped(MemberPolicy::STRICT, None);
        buf.write_i32(5).unwrap();
        assert!(matches!(
            writer.write_value("nope", &mut buf),
            Err(Error::MissingMember { .. })
        ));
        assert!(matches!(
            writer.write_value("id", &mut buf),
            Err(Error::Access { access: AccessKind::Write, .. })
        ));

        let p = point();
        let reader = ObjectReader::new(&p);
        let mut staged = ValueBuffer::scoped(MemberPolicy::STRICT, None);
        assert!(matches!(
            reader.read_value("secret", &mut staged),
            Err(Error::Access { access: AccessKind::Read, .. })
        ));
    }

    #[test]
    fn test_derive_round_trip_through_staging() {
        let p = point();
        let mut buf = ValueBuffer::new();
        p.write_value(&mut buf).unwrap();
        let back = Point::read_value(&mut buf).unwrap();
        // write-only members are not emitted, read-only ones are not assigned.
        assert_eq!(back, Point { x: 1, y: 2, id: 0, secret: String::new() });
    }

    #[test]
    fn test_stage_member_owns_structures() {
        #[derive(Default, Value)]
        struct Bag {
            items: Vec<u8>,
        }
        let bag = Bag { items: vec![1, 2] };
        let mut out = ValueBuffer::new();
        stage_member(&bag, "items", &mut out).unwrap();
        drop(bag);
        assert_eq!(
            DynamicValue::read_value(&mut out).unwrap(),
            DynamicValue::Array(vec![DynamicValue::U64(1), DynamicValue::U64(2)])
        );
    }
}
