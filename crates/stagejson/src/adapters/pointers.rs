// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Smart pointers.
//!
//! `Box` and `Arc` are transparent. `Rc<RefCell<T>>` is the shared node:
//! its allocation address is the identity the codecs use for reference
//! tracking, and on decode it can adopt a node built earlier in the same
//! document (`ref_<n>`).

use super::object::{stage_member, Object, ObjectReader, ObjectWriter};
use crate::contracts::{ElementFilter, MapReader, MapWriter, Shared, ValueReader, ValueWriter};
use crate::dispatch::{self, Value};
use crate::error::{Error, Result};
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

impl<T: Value> Value for Box<T> {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        dispatch::write_value(&**self, writer)
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        dispatch::read_value(reader).map(Box::new)
    }
}

impl<T: Value> Value for Arc<T> {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        dispatch::write_value(&**self, writer)
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        dispatch::read_value(reader).map(Arc::new)
    }
}

fn busy<T>() -> Error {
    Error::unsupported(
        std::any::type_name::<T>(),
        "shared node is already mutably borrowed",
    )
}

/// Encode side of a shared node.
struct SharedReader<'a, T> {
    node: &'a Rc<RefCell<T>>,
}

impl<T: Object> MapReader for SharedReader<'_, T> {
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

    fn identity(&self) -> Option<u64> {
        Some(Rc::as_ptr(self.node) as *const () as usize as u64)
    }

    fn read_value<'s>(&'s self, key: &str, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        let guard = self.node.try_borrow().map_err(|_| busy::<T>())?;
        // The guard dies here, so whatever `dest` keeps must be owned.
        stage_member(&*guard, key, dest)
    }

    fn read_all(&self, dest: &mut dyn MapWriter) -> Result<()> {
        let guard = self.node.try_borrow().map_err(|_| busy::<T>())?;
        ObjectReader::new(&*guard).read_all(dest)
    }

    fn read_all_filtered(
        &self,
        dest: &mut dyn MapWriter,
        filter: &mut ElementFilter<'_>,
    ) -> Result<()> {
        let guard = self.node.try_borrow().map_err(|_| busy::<T>())?;
        ObjectReader::new(&*guard).read_all_filtered(dest, filter)
    }
}

/// Decode side of a shared node.
struct SharedWriter<T> {
    node: Rc<RefCell<T>>,
    written: usize,
}

impl<T: Object> MapWriter for SharedWriter<T> {
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
        let mut guard = self.node.try_borrow_mut().map_err(|_| busy::<T>())?;
        ObjectWriter::new(&mut *guard).write_value(key, src)?;
        self.written += 1;
        Ok(())
    }

    fn content(&self) -> Option<Shared> {
        Some(self.node.clone() as Shared)
    }

    fn set_content(&mut self, content: &Shared) -> bool {
        match content.clone().downcast::<RefCell<T>>() {
            Ok(node) => {
                self.node = node;
                true
            }
            Err(_) => false,
        }
    }
}

impl<T: Object + Default> Value for Rc<RefCell<T>> {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_object(Box::new(SharedReader { node: self }))
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        let mut writer = SharedWriter {
            node: Rc::new(RefCell::new(T::default())),
            written: 0,
        };
        reader.read_object(&mut writer)?;
        Ok(writer.node)
    }
}
