// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Index-addressed containers.

use crate::contracts::{SequenceReader, SequenceWriter, ValueReader, ValueWriter};
use crate::dispatch::{self, Value};
use crate::error::{Error, Result};
use std::collections::VecDeque;

fn out_of_range<T>(index: usize, count: usize) -> Error {
    Error::unsupported(
        std::any::type_name::<T>(),
        format!("index {} out of range for {} elements", index, count),
    )
}

/// Sequence reader over a borrowed slice.
pub struct SliceReader<'a, T> {
    items: &'a [T],
}

impl<'a, T> SliceReader<'a, T> {
    pub fn new(items: &'a [T]) -> Self {
        Self { items }
    }
}

impl<T: Value> SequenceReader for SliceReader<'_, T> {
    fn count(&self) -> usize {
        self.items.len()
    }

    fn read_value<'s>(&'s self, index: usize, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        match self.items.get(index) {
            Some(item) => dispatch::write_value(item, dest),
            None => Err(out_of_range::<T>(index, self.items.len())),
        }
    }
}

struct DequeReader<'a, T> {
    items: &'a VecDeque<T>,
}

impl<T: Value> SequenceReader for DequeReader<'_, T> {
    fn count(&self) -> usize {
        self.items.len()
    }

    fn read_value<'s>(&'s self, index: usize, dest: &mut dyn ValueWriter<'s>) -> Result<()> {
        match self.items.get(index) {
            Some(item) => dispatch::write_value(item, dest),
            None => Err(out_of_range::<T>(index, self.items.len())),
        }
    }
}

/// Sequence writer collecting into a `Vec`.
///
/// `initialize` only reserves; writes past the end append, so a
/// destination sized too small simply grows.
pub struct VecWriter<T> {
    items: Vec<T>,
}

impl<T> Default for VecWriter<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> VecWriter<T> {
    pub fn into_inner(self) -> Vec<T> {
        self.items
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }
}

impl<T: Value> SequenceWriter for VecWriter<T> {
    fn initialize(&mut self, capacity: usize) {
        self.items.reserve(capacity);
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    fn write_value(&mut self, index: usize, src: &mut dyn ValueReader) -> Result<()> {
        let value = dispatch::read_value::<T>(src)?;
        match self.items.get_mut(index) {
            Some(slot) => *slot = value,
            None => self.items.push(value),
        }
        Ok(())
    }
}

fn read_vec<T: Value>(reader: &mut dyn ValueReader) -> Result<Vec<T>> {
    let mut items = VecWriter::default();
    reader.read_array(&mut items)?;
    Ok(items.into_inner())
}

impl<T: Value> Value for Vec<T> {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_array(Box::new(SliceReader::new(self)))
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        read_vec(reader)
    }
}

impl<T: Value> Value for VecDeque<T> {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_array(Box::new(DequeReader { items: self }))
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        read_vec(reader).map(VecDeque::from)
    }
}

impl<T: Value> Value for Box<[T]> {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_array(Box::new(SliceReader::new(self)))
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        read_vec(reader).map(Vec::into_boxed_slice)
    }
}

impl<T: Value, const N: usize> Value for [T; N] {
    fn write_value<'a>(&'a self, writer: &mut dyn ValueWriter<'a>) -> Result<()> {
        writer.write_array(Box::new(SliceReader::new(self)))
    }

    fn read_value(reader: &mut dyn ValueReader) -> Result<Self> {
        let items = read_vec::<T>(reader)?;
        let found = items.len();
        items.try_into().map_err(|_| {
            Error::unsupported(
                std::any::type_name::<Self>(),
                format!("expected {} elements, found {}", N, found),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::ValueBuffer;

    #[test]
    fn test_vec_writer_grows_past_initial_capacity() {
        let source = vec![1, 2, 3, 4];
        let mut writer = VecWriter::<i32>::default();
        writer.initialize(3);
        assert!(writer.capacity() >= 3);
        writer.write_all(&SliceReader::new(&source)).unwrap();
        assert_eq!(writer.count(), 4);
        assert_eq!(writer.into_inner(), source);
    }

    #[test]
    fn test_vec_writer_overwrites_existing_index() {
        let mut writer = VecWriter::<u8>::default();
        let mut buf = ValueBuffer::new();
        buf.write_u8(1).unwrap();
        writer.write_value(0, &mut buf).unwrap();
        buf.write_u8(9).unwrap();
        writer.write_value(0, &mut buf).unwrap();
        assert_eq!(writer.into_inner(), vec![9]);
    }

    #[test]
    fn test_containers_round_trip() {
        let deque: VecDeque<i64> = (0..5).collect();
        let mut buf = ValueBuffer::new();
        deque.write_value(&mut buf).unwrap();
        assert_eq!(VecDeque::<i64>::read_value(&mut buf).unwrap(), deque);

        let array = [1.5f64, 2.5, 3.5];
        let mut buf = ValueBuffer::new();
        array.write_value(&mut buf).unwrap();
        assert_eq!(<[f64; 3]>::read_value(&mut buf).unwrap(), array);
        assert!(<[f64; 2]>::read_value(&mut buf).is_err());

        let boxed: Box<[String]> = vec!["x".to_string()].into_boxed_slice();
        let mut buf = ValueBuffer::new();
        boxed.write_value(&mut buf).unwrap();
        assert_eq!(Box::<[String]>::read_value(&mut buf).unwrap(), boxed);
    }

    #[test]
    fn test_slice_reader_index_out_of_range() {
        let items = [1u8];
        let reader = SliceReader::new(&items);
        assert!(reader.get(0).is_ok());
        assert!(matches!(reader.get(1), Err(Error::UnsupportedShape { .. })));
    }
}
