// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON text reader.
//!
//! A single forward scan over the input bytes, no token stream. Every typed
//! read sniffs the value under the cursor, stages it as a scalar and lets
//! the staging buffer apply the conversion rules, so `true` read as an
//! integer or `"12"` read as a float behave exactly as they would from any
//! other source.
//!
//! Leniencies on input only: single-quoted strings, bare keys, trailing
//! commas, case-insensitive `true`/`false`/`null`/`undefined`, and
//! `ref_<n>` markers in reference mode.

use super::number::{self, ParsedNumber};
use super::options::{JsonOptions, ReferenceMode};
use crate::contracts::{
    BasicType, MapWriter, MemberPolicy, Opaque, RawJson, SequenceWriter, Shared, ValueReader,
    ValueWriter,
};
use crate::error::{Error, ParseError, ParseErrorKind, Result};
use crate::idcache::IdCache;
use crate::staging::ValueBuffer;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use std::borrow::Cow;

/// Capacity hint handed to array destinations; they grow past it.
const ARRAY_CAPACITY_HINT: usize = 3;

/// Literal words, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal {
    True,
    False,
    Null,
    Reference(usize),
}

pub(crate) struct Deserializer<'t, 'o> {
    text: &'t str,
    bytes: &'t [u8],
    pos: usize,
    opts: &'o JsonOptions,
    depth: usize,
    /// Tag of the value starting at the cached position.
    sniffed: Option<(usize, BasicType)>,
    /// Number parsed at the cached position, with the end of its span.
    number: Option<(usize, ParsedNumber, usize)>,
    scratch: ValueBuffer<'static>,
    /// `ref_<n>` targets: shared content and its tag, keyed by `n`.
    refs: IdCache<(Shared, BasicType)>,
    next_ref: u64,
    targeted_id: Option<u64>,
}

impl<'t, 'o> Deserializer<'t, 'o> {
    pub(crate) fn new(text: &'t str, opts: &'o JsonOptions, targeted_id: Option<u64>) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            opts,
            depth: 0,
            sniffed: None,
            number: None,
            scratch: ValueBuffer::scoped(opts.member_policy(), targeted_id),
            refs: IdCache::new(),
            next_ref: 0,
            targeted_id,
        }
    }

    /// Succeeds only if nothing but whitespace follows the value just read.
    pub(crate) fn finish(&mut self) -> Result<()> {
        self.skip_whitespace();
        if self.pos < self.bytes.len() {
            return Err(self.error(ParseErrorKind::TrailingCharacters));
        }
        log::trace!(
            "[json] deserialized {} bytes, {} registered references",
            self.bytes.len(),
            self.refs.len()
        );
        Ok(())
    }

    fn error(&self, kind: ParseErrorKind) -> Error {
        self.error_at(kind, self.pos)
    }

    fn error_at(&self, kind: ParseErrorKind, index: usize) -> Error {
        Error::Parse(ParseError::locate(kind, self.text, index))
    }

    /// Error for the byte under the cursor: end of input or unexpected char.
    fn unexpected(&self) -> Error {
        if self.pos >= self.bytes.len() {
            self.error(ParseErrorKind::UnexpectedEnd)
        } else {
            self.error(ParseErrorKind::UnexpectedChar)
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    // ------------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------------

    /// Word at the cursor, without consuming it.
    fn word_end(&self) -> usize {
        let mut end = self.pos;
        while end < self.bytes.len() && (self.bytes[end].is_ascii_alphanumeric() || self.bytes[end] == b'_') {
            end += 1;
        }
        end
    }

    /// Literal at the cursor and the position just past it.
    fn peek_literal(&self) -> Result<(Literal, usize)> {
        let end = self.word_end();
        let word = &self.text[self.pos..end];
        let literal = if word.eq_ignore_ascii_case("true") {
            Literal::True
        } else if word.eq_ignore_ascii_case("false") {
            Literal::False
        } else if word.eq_ignore_ascii_case("null") || word.eq_ignore_ascii_case("undefined") {
            Literal::Null
        } else if word.len() > 4 && word[..4].eq_ignore_ascii_case("ref_") {
            let n = word[4..]
                .parse::<usize>()
                .map_err(|_| self.error(ParseErrorKind::InvalidLiteral))?;
            Literal::Reference(n)
        } else if word.is_empty() {
            return Err(self.unexpected());
        } else {
            return Err(self.error(ParseErrorKind::InvalidLiteral));
        };
        Ok((literal, end))
    }

    fn reference(&self, n: usize) -> Result<&(Shared, BasicType)> {
        self.refs
            .get(n as u64)
            .ok_or_else(|| self.error(ParseErrorKind::UnknownReference(n)))
    }

    /// Number span at the cursor, parsed. Parsed once per position, so a
    /// sniff followed by a read scans the digits a single time.
    fn peek_number(&mut self) -> Result<(ParsedNumber, usize)> {
        if let Some((pos, parsed, end)) = self.number {
            if pos == self.pos {
                return Ok((parsed, end));
            }
        }
        let end = number::scan_end(self.bytes, self.pos);
        match number::parse_number(&self.text[self.pos..end]) {
            Some(parsed) => {
                self.number = Some((self.pos, parsed, end));
                Ok((parsed, end))
            }
            None => Err(self.error(ParseErrorKind::InvalidNumber)),
        }
    }

    /// Float read from the source span rather than the staged number, so
    /// mantissas too long for `f64` round once, from the digits.
    fn read_span_float<F: std::str::FromStr + Copy>(
        &mut self,
        expected: &'static str,
        staged: impl Fn(ParsedNumber) -> bool,
        finite: impl Fn(F) -> bool,
    ) -> Result<Option<F>> {
        match self.peek() {
            Some(b) if number::is_number_start(b) => {}
            _ => return Ok(None),
        }
        let (parsed, end) = self.peek_number()?;
        if staged(parsed) {
            return Ok(None);
        }
        let span = self.text[self.pos..end].trim_start_matches('+');
        let value: F = span
            .parse()
            .map_err(|_| self.error(ParseErrorKind::InvalidNumber))?;
        if !finite(value) {
            return Err(Error::mismatch(expected, parsed.basic_type()));
        }
        self.pos = end;
        Ok(Some(value))
    }

    /// Decode the string literal at the cursor and move past it.
    ///
    /// Borrows from the input when the literal has no escapes.
    fn parse_string(&mut self) -> Result<Cow<'t, str>> {
        let text = self.text;
        let bytes = self.bytes;
        let quote = bytes[self.pos];
        let start = self.pos + 1;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => break,
                b if b == quote => {
                    self.pos = i + 1;
                    return Ok(Cow::Borrowed(&text[start..i]));
                }
                _ => i += 1,
            }
        }
        if i >= bytes.len() {
            self.pos = bytes.len();
            return Err(self.error(ParseErrorKind::UnexpectedEnd));
        }

        let mut decoded = String::with_capacity(i - start + 16);
        decoded.push_str(&text[start..i]);
        let mut run = i;
        while i < bytes.len() {
            let b = bytes[i];
            if b == quote {
                decoded.push_str(&text[run..i]);
                self.pos = i + 1;
                return Ok(Cow::Owned(decoded));
            }
            if b != b'\\' {
                i += 1;
                continue;
            }
            decoded.push_str(&text[run..i]);
            let Some(&escape) = bytes.get(i + 1) else {
                break;
            };
            match escape {
                b'b' => decoded.push('\u{8}'),
                b'f' => decoded.push('\u{c}'),
                b'n' => decoded.push('\n'),
                b't' => decoded.push('\t'),
                b'r' => decoded.push('\r'),
                b'u' => {
                    let (ch, next) = self.decode_unicode(i)?;
                    decoded.push(ch);
                    i = next;
                    run = i;
                    continue;
                }
                _ => {
                    // `\" \' \\ \/` and any other escaped character stand for themselves.
                    let ch = text[i + 1..].chars().next().unwrap_or('\\');
                    decoded.push(ch);
                    i += 1 + ch.len_utf8();
                    run = i;
                    continue;
                }
            }
            i += 2;
            run = i;
        }
        self.pos = bytes.len();
        Err(self.error(ParseErrorKind::UnexpectedEnd))
    }

    fn hex4(&self, at: usize) -> Result<u16> {
        let digits = self
            .text
            .get(at..at + 4)
            .filter(|d| d.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| self.error_at(ParseErrorKind::InvalidEscape, at))?;
        u16::from_str_radix(digits, 16).map_err(|_| self.error_at(ParseErrorKind::InvalidEscape, at))
    }

    /// `\uXXXX` at `at`, combining a following low surrogate. Lone
    /// surrogates decode to U+FFFD.
    fn decode_unicode(&self, at: usize) -> Result<(char, usize)> {
        let high = self.hex4(at + 2)?;
        let next = at + 6;
        if (0xD800..0xDC00).contains(&high) {
            if self.bytes.get(next) == Some(&b'\\') && self.bytes.get(next + 1) == Some(&b'u') {
                let low = self.hex4(next + 2)?;
                if (0xDC00..0xE000).contains(&low) {
                    let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                    return Ok((char::from_u32(code).unwrap_or('\u{FFFD}'), next + 6));
                }
            }
            return Ok(('\u{FFFD}', next));
        }
        Ok((char::from_u32(u32::from(high)).unwrap_or('\u{FFFD}'), next))
    }

    // ------------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------------

    /// Parse the scalar at the cursor into `scratch` and move past it.
    fn stage_scalar(&mut self, expected: &'static str) -> Result<()> {
        let Some(byte) = self.peek() else {
            return Err(self.unexpected());
        };
        match byte {
            b'"' | b'\'' => {
                let value = self.parse_string()?;
                self.scratch.write_string(&value)
            }
            b'{' => Err(Error::mismatch(expected, BasicType::Object)),
            b'[' => Err(Error::mismatch(expected, BasicType::Array)),
            b if number::is_number_start(b) => {
                let (parsed, end) = self.peek_number()?;
                let span = &self.text[self.pos..end];
                parsed.stage(span, &mut self.scratch)?;
                self.pos = end;
                Ok(())
            }
            _ => {
                let (literal, end) = self.peek_literal()?;
                match literal {
                    Literal::True => self.scratch.write_bool(true)?,
                    Literal::False => self.scratch.write_bool(false)?,
                    Literal::Null => self.scratch.write_null()?,
                    Literal::Reference(n) => {
                        let found = self.reference(n)?.1;
                        return Err(Error::mismatch(expected, found));
                    }
                }
                self.pos = end;
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------------
    // Structures
    // ------------------------------------------------------------------------

    /// Substitute the destination's content with `ref_<n>`'s.
    fn adopt_reference(
        &mut self,
        n: usize,
        end: usize,
        expected: &'static str,
        set_content: impl FnOnce(&Shared) -> bool,
    ) -> Result<()> {
        let (shared, tag) = self.reference(n)?;
        if !set_content(shared) {
            return Err(Error::mismatch(expected, *tag));
        }
        self.pos = end;
        Ok(())
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.opts.max_depth {
            return Err(Error::DepthExceeded {
                max_depth: self.opts.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn register(&mut self, content: Option<Shared>, tag: BasicType) {
        if self.opts.reference_mode != ReferenceMode::Marker {
            return;
        }
        if let Some(content) = content {
            let _ = self.refs.try_insert(self.next_ref, (content, tag));
            self.next_ref += 1;
        }
    }

    /// Deliver the value at the cursor through `deliver`; skip it if the
    /// destination left it unread.
    fn deliver_value(&mut self, deliver: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.skip_whitespace();
        let start = self.pos;
        deliver(self)?;
        if self.pos == start {
            self.skip()?;
        }
        Ok(())
    }

    /// After an element: `,` continues (a `,` right before the closing
    /// bracket is tolerated), the closing bracket ends. Returns `true` at the end.
    fn separator(&mut self, close: u8) -> Result<bool> {
        match self.peek() {
            Some(b',') => {
                self.pos += 1;
                if self.peek() == Some(close) {
                    self.pos += 1;
                    return Ok(true);
                }
                Ok(false)
            }
            Some(b) if b == close => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Object key: quoted (either quote) or bare up to `:`.
    fn parse_key(&mut self) -> Result<Cow<'t, str>> {
        match self.peek() {
            Some(b'"' | b'\'') => self.parse_string(),
            Some(_) => {
                let start = self.pos;
                let offset = self.bytes[start..]
                    .iter()
                    .position(|&b| b == b':' || b == b'}')
                    .ok_or_else(|| self.error_at(ParseErrorKind::UnexpectedEnd, self.bytes.len()))?;
                let key = self.text[start..start + offset].trim();
                if key.is_empty() {
                    return Err(self.unexpected());
                }
                self.pos = start + offset;
                Ok(Cow::Borrowed(key))
            }
            None => Err(self.unexpected()),
        }
    }
}

/// Destination that drops everything; used to skip structures.
struct Discard;

impl SequenceWriter for Discard {
    fn initialize(&mut self, _capacity: usize) {}

    fn count(&self) -> usize {
        0
    }

    fn write_value(&mut self, _index: usize, src: &mut dyn ValueReader) -> Result<()> {
        src.skip()
    }
}

impl MapWriter for Discard {
    fn initialize(&mut self, _capacity: usize) {}

    fn count(&self) -> usize {
        0
    }

    fn write_value(&mut self, _key: &str, src: &mut dyn ValueReader) -> Result<()> {
        src.skip()
    }
}

macro_rules! staged_read {
    ($($name:ident -> $ty:ty, $expected:literal;)*) => {
        $(
            fn $name(&mut self) -> Result<$ty> {
                self.stage_scalar($expected)?;
                self.scratch.$name()
            }
        )*
    };
}

impl ValueReader for Deserializer<'_, '_> {
    fn basic_type(&mut self) -> Result<BasicType> {
        self.skip_whitespace();
        if let Some((pos, tag)) = self.sniffed {
            if pos == self.pos {
                return Ok(tag);
            }
        }
        let Some(&byte) = self.bytes.get(self.pos) else {
            return Err(self.unexpected());
        };
        let tag = match byte {
            b'"' | b'\'' => BasicType::String,
            b'{' => BasicType::Object,
            b'[' => BasicType::Array,
            b if number::is_number_start(b) => self.peek_number()?.0.basic_type(),
            _ => match self.peek_literal()?.0 {
                Literal::True | Literal::False => BasicType::Bool,
                Literal::Null => BasicType::Null,
                Literal::Reference(n) => self.reference(n)?.1,
            },
        };
        self.sniffed = Some((self.pos, tag));
        Ok(tag)
    }

    fn try_read_null(&mut self) -> Result<bool> {
        if self.basic_type()? != BasicType::Null {
            return Ok(false);
        }
        let (_, end) = self.peek_literal()?;
        self.pos = end;
        Ok(true)
    }

    staged_read! {
        read_bool -> bool, "bool";
        read_i8 -> i8, "i8";
        read_i16 -> i16, "i16";
        read_i32 -> i32, "i32";
        read_i64 -> i64, "i64";
        read_u8 -> u8, "u8";
        read_u16 -> u16, "u16";
        read_u32 -> u32, "u32";
        read_u64 -> u64, "u64";
        read_decimal -> Decimal, "decimal";
        read_char -> char, "char";
        read_datetime -> DateTime<FixedOffset>, "datetime";
        read_string -> String, "string";
    }

    fn read_f32(&mut self) -> Result<f32> {
        // Every span is parsed straight to `f32`; going through `f64` would
        // round twice.
        match self.read_span_float("f32", |_| false, f32::is_finite)? {
            Some(value) => Ok(value),
            None => {
                self.stage_scalar("f32")?;
                self.scratch.read_f32()
            }
        }
    }

    fn read_f64(&mut self) -> Result<f64> {
        // Only spans staged as decimals lose the exact digits on the way.
        let exact = |parsed: ParsedNumber| !matches!(parsed, ParsedNumber::Decimal(_));
        match self.read_span_float("f64", exact, f64::is_finite)? {
            Some(value) => Ok(value),
            None => {
                self.stage_scalar("f64")?;
                self.scratch.read_f64()
            }
        }
    }

    /// Captures the next value's source text verbatim.
    fn read_opaque(&mut self) -> Result<Opaque> {
        self.skip_whitespace();
        let start = self.pos;
        self.skip()?;
        Ok(Opaque::new(RawJson(self.text[start..self.pos].to_string())))
    }

    fn read_array(&mut self, dest: &mut dyn SequenceWriter) -> Result<()> {
        match self.peek() {
            Some(b'[') => {}
            Some(b) if b.is_ascii_alphabetic() => {
                let (literal, end) = self.peek_literal()?;
                return match literal {
                    Literal::Reference(n) => {
                        self.adopt_reference(n, end, "array", |shared| dest.set_content(shared))
                    }
                    Literal::Null => Err(Error::mismatch("array", BasicType::Null)),
                    _ => Err(Error::mismatch("array", BasicType::Bool)),
                };
            }
            Some(_) => return Err(Error::mismatch("array", self.basic_type()?)),
            None => return Err(self.unexpected()),
        }
        self.enter()?;
        self.pos += 1;
        self.register(dest.content(), BasicType::Array);
        dest.initialize(ARRAY_CAPACITY_HINT);

        let mut index = 0;
        if self.peek() == Some(b']') {
            self.pos += 1;
        } else {
            loop {
                self.deliver_value(|de| dest.write_value(index, de))?;
                index += 1;
                if self.separator(b']')? {
                    break;
                }
            }
        }
        self.depth -= 1;
        Ok(())
    }

    fn read_object(&mut self, dest: &mut dyn MapWriter) -> Result<()> {
        match self.peek() {
            Some(b'{') => {}
            Some(b) if b.is_ascii_alphabetic() => {
                let (literal, end) = self.peek_literal()?;
                return match literal {
                    Literal::Reference(n) => {
                        self.adopt_reference(n, end, "object", |shared| dest.set_content(shared))
                    }
                    Literal::Null => Err(Error::mismatch("object", BasicType::Null)),
                    _ => Err(Error::mismatch("object", BasicType::Bool)),
                };
            }
            Some(_) => return Err(Error::mismatch("object", self.basic_type()?)),
            None => return Err(self.unexpected()),
        }
        self.enter()?;
        self.pos += 1;
        self.register(dest.content(), BasicType::Object);
        dest.initialize(0);

        if self.peek() == Some(b'}') {
            self.pos += 1;
        } else {
            loop {
                let key = self.parse_key()?;
                self.expect(b':')?;
                self.deliver_value(|de| dest.write_value(&key, de))?;
                if self.separator(b'}')? {
                    break;
                }
            }
        }
        self.depth -= 1;
        Ok(())
    }

    fn skip(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'[') => self.read_array(&mut Discard),
            Some(b'{') => self.read_object(&mut Discard),
            Some(b'"' | b'\'') => self.parse_string().map(drop),
            Some(b) if number::is_number_start(b) => {
                let (_, end) = self.peek_number()?;
                self.pos = end;
                Ok(())
            }
            Some(_) => {
                let (literal, end) = self.peek_literal()?;
                if let Literal::Reference(n) = literal {
                    self.reference(n)?;
                }
                self.pos = end;
                Ok(())
            }
            None => Err(self.unexpected()),
        }
    }

    fn member_policy(&self) -> MemberPolicy {
        self.opts.member_policy()
    }

    fn targeted_id(&self) -> Option<u64> {
        self.targeted_id
    }
}
