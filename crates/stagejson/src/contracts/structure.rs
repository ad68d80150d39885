// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural contracts: index-addressed sequences and name-addressed maps.
//!
//! Readers are the encode side (an existing structure exposes its elements),
//! writers the decode side (a structure under construction accepts elements).
//! Bulk operations stage every element in a [`ValueBuffer`] so the two sides
//! never need to know each other's element types.

use super::{MemberPolicy, ValueReader, ValueWriter};
use crate::error::Result;
use crate::staging::ValueBuffer;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

/// Handle a destination hands out so later `ref_<n>` tokens can point at it.
pub type Shared = Rc<dyn Any>;

/// Address of an element inside its container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key<'k> {
    Index(usize),
    Name(Cow<'k, str>),
}

impl Key<'_> {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Index(_) => None,
            Key::Name(n) => Some(n),
        }
    }
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "[{}]", i),
            Key::Name(n) => write!(f, "{}", n),
        }
    }
}

/// Predicate consulted per element by the filtered bulk reads.
pub type ElementFilter<'f> = dyn FnMut(&Key<'_>, &ValueBuffer<'_>) -> bool + 'f;

/// Existing sequence exposing its elements.
pub trait SequenceReader {
    fn count(&self) -> usize;

    fn keys(&self) -> Range<usize> {
        0..self.count()
    }

    /// Stable identity of the underlying structure, for reference tracking.
    fn identity(&self) -> Option<u64> {
        None
    }

    /// Write element `index` into `dest`.
    fn read_value<'s>(&'s self, index: usize, dest: &mut dyn ValueWriter<'s>) -> Result<()>;

    /// Element `index` as a staged value.
    fn get(&self, index: usize) -> Result<ValueBuffer<'_>> {
        let mut staged = ValueBuffer::new();
        self.read_value(index, &mut staged)?;
        Ok(staged)
    }

    /// Deliver every element to `dest`, in order.
    fn read_all(&self, dest: &mut dyn SequenceWriter) -> Result<()> {
        dest.initialize(self.count());
        for index in self.keys() {
            let mut staged = ValueBuffer::scoped(dest.member_policy(), dest.targeted_id());
            self.read_value(index, &mut staged)?;
            dest.write_value(index, &mut staged)?;
        }
        Ok(())
    }

    /// Deliver the elements `filter` accepts; accepted elements are renumbered
    /// densely in `dest`.
    fn read_all_filtered(
        &self,
        dest: &mut dyn SequenceWriter,
        filter: &mut ElementFilter<'_>,
    ) -> Result<()> {
        dest.initialize(self.count());
        let mut written = 0;
        for index in self.keys() {
            let mut staged = ValueBuffer::scoped(dest.member_policy(), dest.targeted_id());
            self.read_value(index, &mut staged)?;
            if filter(&Key::Index(index), &staged) {
                dest.write_value(written, &mut staged)?;
                written += 1;
            }
        }
        Ok(())
    }
}

/// Existing map exposing its members.
pub trait MapReader {
    fn count(&self) -> usize;

    /// Member names in emission order.
    fn keys(&self) -> Vec<Cow<'_, str>>;

    fn identity(&self) -> Option<u64> {
        None
    }

    fn read_value<'s>(&'s self, key: &str, dest: &mut dyn ValueWriter<'s>) -> Result<()>;

    fn get(&self, key: &str) -> Result<ValueBuffer<'_>> {
        let mut staged = ValueBuffer::new();
        self.read_value(key, &mut staged)?;
        Ok(staged)
    }

    fn read_all(&self, dest: &mut dyn MapWriter) -> Result<()> {
        dest.initialize(self.count());
        for key in self.keys() {
            let mut staged = ValueBuffer::scoped(dest.member_policy(), dest.targeted_id());
            self.read_value(&key, &mut staged)?;
            dest.write_value(&key, &mut staged)?;
        }
        Ok(())
    }

    fn read_all_filtered(
        &self,
        dest: &mut dyn MapWriter,
        filter: &mut ElementFilter<'_>,
    ) -> Result<()> {
        dest.initialize(self.count());
        for key in self.keys() {
            let mut staged = ValueBuffer::scoped(dest.member_policy(), dest.targeted_id());
            self.read_value(&key, &mut staged)?;
            if filter(&Key::Name(Cow::Borrowed(&key)), &staged) {
                dest.write_value(&key, &mut staged)?;
            }
        }
        Ok(())
    }
}

/// Sequence under construction.
pub trait SequenceWriter {
    /// Hint the expected element count before the first `write_value`.
    fn initialize(&mut self, capacity: usize);

    fn count(&self) -> usize;

    /// Set element `index` from `src`. Indices arrive in increasing order;
    /// an index equal to `count()` appends.
    fn write_value(&mut self, index: usize, src: &mut dyn ValueReader) -> Result<()>;

    /// Copy every element of `src`.
    fn write_all(&mut self, src: &dyn SequenceReader) -> Result<()> {
        self.initialize(src.count());
        for index in src.keys() {
            let mut staged = src.get(index)?;
            self.write_value(index, &mut staged)?;
        }
        Ok(())
    }

    /// Shareable handle to the structure being built, if it has one.
    fn content(&self) -> Option<Shared> {
        None
    }

    /// Replace the whole structure with a previously shared one.
    /// Returns `false` when the destination cannot adopt `content`.
    fn set_content(&mut self, _content: &Shared) -> bool {
        false
    }

    /// Member policy elements staged for this destination should carry.
    fn member_policy(&self) -> MemberPolicy {
        MemberPolicy::LENIENT
    }

    /// Targeted-override id elements staged for this destination should carry.
    fn targeted_id(&self) -> Option<u64> {
        None
    }
}

/// Map under construction.
pub trait MapWriter {
    fn initialize(&mut self, capacity: usize);

    fn count(&self) -> usize;

    /// Names the destination accepts, if it has a fixed set.
    fn keys(&self) -> Vec<Cow<'_, str>> {
        Vec::new()
    }

    fn write_value(&mut self, key: &str, src: &mut dyn ValueReader) -> Result<()>;

    fn write_all(&mut self, src: &dyn MapReader) -> Result<()> {
        self.initialize(src.count());
        for key in src.keys() {
            let mut staged = src.get(&key)?;
            self.write_value(&key, &mut staged)?;
        }
        Ok(())
    }

    fn content(&self) -> Option<Shared> {
        None
    }

    fn set_content(&mut self, _content: &Shared) -> bool {
        false
    }

    fn member_policy(&self) -> MemberPolicy {
        MemberPolicy::LENIENT
    }

    fn targeted_id(&self) -> Option<u64> {
        None
    }
}

// Borrowed readers are readers too; the staging buffer relies on this to
// replay a stored structure without giving it up.
impl<R: SequenceReader + ?Sized> SequenceReader for &R {
    fn count(&self) -> usize {
        (**self).count()
    }

    fn identity(&self) -> Option<u64> {
        (**self).identity()
    }

    fn read_value<'s>(&'s self, index: usize, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        (**self).read_value(index, dest)
    }

    fn read_all(&self, dest: &mut dyn SequenceWriter) -> Result<()> {
        (**self).read_all(dest)
    }

    fn read_all_filtered(
        &self,
        dest: &mut dyn SequenceWriter,
        filter: &mut ElementFilter<'_>,
    ) -> Result<()> {
        (**self).read_all_filtered(dest, filter)
    }
}

impl<R: MapReader + ?Sized> MapReader for &R {
    fn count(&self) -> usize {
        (**self).count()
    }

    fn keys(&self) -> Vec<Cow<'_, str>> {
        (**self).keys()
    }

    fn identity(&self) -> Option<u64> {
        (**self).identity()
    }

    fn read_value<'s>(&'s self, key: &str, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        (**self).read_value(key, dest)
    }

    fn read_all(&self, dest: &mut dyn MapWriter) -> Result<()> {
        (**self).read_all(dest)
    }

    fn read_all_filtered(
        &self,
        dest: &mut dyn MapWriter,
        filter: &mut ElementFilter<'_>,
    ) -> Result<()> {
        (**self).read_all_filtered(dest, filter)
    }
}
