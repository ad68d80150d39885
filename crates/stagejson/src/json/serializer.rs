// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON text writer.
//!
//! The serializer is a [`ValueWriter`] for any lifetime: structural readers
//! are walked as soon as they arrive, with the serializer itself acting as
//! the destination [`SequenceWriter`] / [`MapWriter`]. Per call it tracks
//! the nesting depth, the identities already emitted and one element count
//! per open structure.

use super::number;
use super::options::{DepthPolicy, JsonOptions, ReferenceMode};
use super::output::OutputBuffer;
use crate::contracts::{
    Key, MapReader, MapWriter, MemberPolicy, Opaque, SequenceReader, SequenceWriter, ValueReader,
    ValueWriter,
};
use crate::error::{Error, Result};
use crate::idcache::IdCache;
use crate::staging::ValueBuffer;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use rust_decimal::Decimal;

/// Strings longer than this are escaped chunk by chunk instead of
/// reserving for the whole string up front.
const CHUNK_THRESHOLD: usize = 256;

/// The ignore-* switches, copied out so the filter closure does not borrow
/// the serializer.
#[derive(Clone, Copy)]
struct Filter {
    null: bool,
    zero: bool,
    empty: bool,
}

impl Filter {
    fn accepts(self, value: &ValueBuffer<'_>) -> bool {
        !((self.null && value.is_null())
            || (self.zero && value.is_zero())
            || (self.empty && value.is_empty_string()))
    }
}

pub(crate) struct Serializer<'o> {
    out: OutputBuffer,
    opts: &'o JsonOptions,
    depth: usize,
    /// Identity to 0-based first-visit ordinal.
    seen: IdCache<usize>,
    next_ref: usize,
    /// Elements written so far, one entry per open structure.
    counts: Vec<usize>,
    targeted_id: Option<u64>,
}

impl<'o> Serializer<'o> {
    pub(crate) fn new(opts: &'o JsonOptions, targeted_id: Option<u64>) -> Self {
        Self {
            out: OutputBuffer::acquire(),
            opts,
            depth: 0,
            seen: IdCache::new(),
            next_ref: 0,
            counts: Vec::new(),
            targeted_id,
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        self.out.as_str()
    }

    pub(crate) fn into_string(self) -> String {
        log::trace!(
            "[json] serialized {} bytes, {} tracked references",
            self.out.len(),
            self.seen.len()
        );
        self.out.as_str().to_owned()
    }

    fn filter(&self) -> Filter {
        Filter {
            null: self.opts.ignore_null,
            zero: self.opts.ignore_zero,
            empty: self.opts.ignore_empty,
        }
    }

    fn newline(&mut self, depth: usize) {
        let opts = self.opts;
        if let Some(indent) = &opts.indent {
            self.out.push_str(&opts.line_break);
            for _ in 0..depth {
                self.out.push_str(indent);
            }
        }
    }

    fn write_quoted(&mut self, text: &str) {
        self.out.push('"');
        if text.len() <= CHUNK_THRESHOLD {
            self.out.reserve(text.len() + 1);
            escape_into(&mut self.out, text);
        } else {
            let mut rest = text;
            while !rest.is_empty() {
                let mut cut = CHUNK_THRESHOLD.min(rest.len());
                while !rest.is_char_boundary(cut) {
                    cut += 1;
                }
                let (chunk, tail) = rest.split_at(cut);
                self.out.reserve(chunk.len());
                escape_into(&mut self.out, chunk);
                rest = tail;
            }
        }
        self.out.push('"');
    }

    /// Reference and depth checks before opening a structure.
    ///
    /// Returns `false` when something else (a marker, `null`) was written in
    /// its place.
    fn begin(&mut self, identity: Option<u64>) -> Result<bool> {
        let mode = self.opts.reference_mode;
        let tracked = identity.filter(|_| mode != ReferenceMode::None);
        if let Some(id) = tracked {
            if let Some(&ordinal) = self.seen.get(id) {
                if mode == ReferenceMode::Marker {
                    self.out.push_str("ref_");
                    number::write_u64(&mut self.out, ordinal as u64);
                } else {
                    self.out.push_str("null");
                }
                return Ok(false);
            }
        }

        if self.depth >= self.opts.max_depth {
            return match self.opts.depth_policy {
                DepthPolicy::Raise => Err(Error::DepthExceeded {
                    max_depth: self.opts.max_depth,
                }),
                DepthPolicy::Truncate => {
                    log::warn!(
                        "[json] depth limit {} reached, structure written as null",
                        self.opts.max_depth
                    );
                    self.out.push_str("null");
                    Ok(false)
                }
            };
        }

        if let Some(id) = tracked {
            let _ = self.seen.try_insert(id, self.next_ref);
            self.next_ref += 1;
        }
        self.depth += 1;
        Ok(true)
    }

    fn write_structure(
        &mut self,
        identity: Option<u64>,
        brackets: (char, char),
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        if !self.begin(identity)? {
            return Ok(());
        }
        self.out.push(brackets.0);
        self.counts.push(0);
        let result = body(self);
        let written = self.counts.pop().unwrap_or(0);
        self.depth -= 1;
        result?;
        if written > 0 {
            self.out.retract_separator();
            self.newline(self.depth);
        }
        self.out.push(brackets.1);
        Ok(())
    }

    fn element_written(&mut self) {
        self.out.push(',');
        if let Some(count) = self.counts.last_mut() {
            *count += 1;
        }
    }
}

impl Drop for Serializer<'_> {
    fn drop(&mut self) {
        std::mem::replace(&mut self.out, OutputBuffer::with_capacity(0)).release();
    }
}

/// Escape `\ " \n \r \t`; everything else is copied as is.
fn escape_into(out: &mut OutputBuffer, text: &str) {
    let bytes = text.as_bytes();
    let mut start = 0;
    for (i, &byte) in bytes.iter().enumerate() {
        let escaped = match byte {
            b'\\' => "\\\\",
            b'"' => "\\\"",
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            _ => continue,
        };
        if start < i {
            out.push_str(&text[start..i]);
        }
        out.push_str(escaped);
        start = i + 1;
    }
    if start < bytes.len() {
        out.push_str(&text[start..]);
    }
}

impl<'a> ValueWriter<'a> for Serializer<'_> {
    fn write_null(&mut self) -> Result<()> {
        self.out.push_str("null");
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.out.push_str(if value { "true" } else { "false" });
        Ok(())
    }

    fn write_i8(&mut self, value: i8) -> Result<()> {
        number::write_i64(&mut self.out, i64::from(value));
        Ok(())
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        number::write_i64(&mut self.out, i64::from(value));
        Ok(())
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        number::write_i64(&mut self.out, i64::from(value));
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        number::write_i64(&mut self.out, value);
        Ok(())
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        number::write_u64(&mut self.out, u64::from(value));
        Ok(())
    }

    fn write_u16(&mut self, value: u16) -> Result<()> {
        number::write_u64(&mut self.out, u64::from(value));
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        number::write_u64(&mut self.out, u64::from(value));
        Ok(())
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        number::write_u64(&mut self.out, value);
        Ok(())
    }

    fn write_f32(&mut self, value: f32) -> Result<()> {
        number::write_f32(&mut self.out, value);
        Ok(())
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        number::write_f64(&mut self.out, value);
        Ok(())
    }

    fn write_decimal(&mut self, value: Decimal) -> Result<()> {
        number::write_decimal(&mut self.out, value);
        Ok(())
    }

    fn write_char(&mut self, value: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.write_quoted(value.encode_utf8(&mut buf));
        Ok(())
    }

    fn write_datetime(&mut self, value: DateTime<FixedOffset>) -> Result<()> {
        self.write_quoted(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_quoted(value);
        Ok(())
    }

    fn write_opaque(&mut self, value: Opaque) -> Result<()> {
        match value.as_raw_json() {
            Some(raw) => {
                self.out.push_str(raw);
                Ok(())
            }
            None => Err(Error::unsupported(
                value.type_name(),
                "only RawJson opaque values can be written as JSON",
            )),
        }
    }

    fn write_array(&mut self, reader: Box<dyn SequenceReader + 'a>) -> Result<()> {
        let filter = self.filter();
        let filtered = self.opts.filters_elements();
        self.write_structure(reader.identity(), ('[', ']'), |ser| {
            if filtered {
                reader.read_all_filtered(ser, &mut |_: &Key<'_>, v: &ValueBuffer<'_>| {
                    filter.accepts(v)
                })
            } else {
                reader.read_all(ser)
            }
        })
    }

    fn write_object(&mut self, reader: Box<dyn MapReader + 'a>) -> Result<()> {
        let filter = self.filter();
        let filtered = self.opts.filters_members();
        self.write_structure(reader.identity(), ('{', '}'), |ser| {
            if filtered {
                reader.read_all_filtered(ser, &mut |_: &Key<'_>, v: &ValueBuffer<'_>| {
                    filter.accepts(v)
                })
            } else {
                reader.read_all(ser)
            }
        })
    }

    fn member_policy(&self) -> MemberPolicy {
        self.opts.member_policy()
    }

    fn targeted_id(&self) -> Option<u64> {
        self.targeted_id
    }
}

impl SequenceWriter for Serializer<'_> {
    fn initialize(&mut self, _capacity: usize) {}

    fn count(&self) -> usize {
        self.counts.last().copied().unwrap_or(0)
    }

    fn write_value(&mut self, _index: usize, src: &mut dyn ValueReader) -> Result<()> {
        self.newline(self.depth);
        src.write_to(self)?;
        self.element_written();
        Ok(())
    }

    fn member_policy(&self) -> MemberPolicy {
        self.opts.member_policy()
    }

    fn targeted_id(&self) -> Option<u64> {
        self.targeted_id
    }
}

impl MapWriter for Serializer<'_> {
    fn initialize(&mut self, _capacity: usize) {}

    fn count(&self) -> usize {
        self.counts.last().copied().unwrap_or(0)
    }

    fn write_value(&mut self, key: &str, src: &mut dyn ValueReader) -> Result<()> {
        self.newline(self.depth);
        self.write_quoted(key);
        self.out.push(':');
        let pad = &self.opts.key_separator_pad;
        if !pad.is_empty() {
            self.out.push_str(pad);
        }
        src.write_to(self)?;
        self.element_written();
        Ok(())
    }

    fn member_policy(&self) -> MemberPolicy {
        self.opts.member_policy()
    }

    fn targeted_id(&self) -> Option<u64> {
        self.targeted_id
    }
}
