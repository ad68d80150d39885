// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Number formatting and parsing.

use super::output::OutputBuffer;
use crate::contracts::{BasicType, ValueWriter};
use crate::error::Result;
use crate::staging::ValueBuffer;
use rust_decimal::Decimal;
use std::fmt::Write;
use std::str::FromStr;

/// Largest mantissa an f64 holds exactly.
const MAX_EXACT_MANTISSA: u64 = 1 << 53;
/// Powers of ten an f64 holds exactly.
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];
/// Above this many significant digits an f64 cannot round-trip the text.
const F64_DIGITS: usize = 17;
/// Above this many significant digits a Decimal cannot either.
const DECIMAL_DIGITS: usize = 28;

// ============================================================================
// Formatting
// ============================================================================

pub(crate) fn write_u64(out: &mut OutputBuffer, mut value: u64) {
    let mut digits = [0u8; 20];
    let mut pos = digits.len();
    loop {
        pos -= 1;
        digits[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    out.reserve(digits.len() - pos);
    for &d in &digits[pos..] {
        out.push(char::from(d));
    }
}

pub(crate) fn write_i64(out: &mut OutputBuffer, value: i64) {
    if value < 0 {
        out.push('-');
    }
    write_u64(out, value.unsigned_abs());
}

fn write_non_finite(out: &mut OutputBuffer, nan: bool, negative: bool) {
    out.push_str(match (nan, negative) {
        (true, _) => "\"NaN\"",
        (false, false) => "\"Infinity\"",
        (false, true) => "\"-Infinity\"",
    });
}

/// Shortest round-trip form; exponent notation outside `[1e-5, 1e17)`.
pub(crate) fn write_f64(out: &mut OutputBuffer, value: f64) {
    if !value.is_finite() {
        return write_non_finite(out, value.is_nan(), value < 0.0);
    }
    let magnitude = value.abs();
    // fmt::Write on OutputBuffer cannot fail.
    let _ = if magnitude == 0.0 || (1e-5..1e17).contains(&magnitude) {
        write!(out, "{}", value)
    } else {
        write!(out, "{:e}", value)
    };
}

pub(crate) fn write_f32(out: &mut OutputBuffer, value: f32) {
    if !value.is_finite() {
        return write_non_finite(out, value.is_nan(), value < 0.0);
    }
    let magnitude = value.abs();
    let _ = if magnitude == 0.0 || (1e-5..1e17).contains(&magnitude) {
        write!(out, "{}", value)
    } else {
        write!(out, "{:e}", value)
    };
}

pub(crate) fn write_decimal(out: &mut OutputBuffer, value: Decimal) {
    let _ = write!(out, "{}", value);
}

// ============================================================================
// Parsing
// ============================================================================

/// Whether `byte` can start a number.
pub(crate) fn is_number_start(byte: u8) -> bool {
    byte.is_ascii_digit() || matches!(byte, b'-' | b'+' | b'.')
}

/// End of the number span starting at `start`.
pub(crate) fn scan_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && matches!(bytes[end], b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E') {
        end += 1;
    }
    end
}

/// A number, classified by the narrowest representation that keeps it exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ParsedNumber {
    I64(i64),
    U64(u64),
    F64(f64),
    Decimal(Decimal),
    /// Too precise for any numeric tag; kept as its source text.
    Text,
}

impl ParsedNumber {
    pub(crate) fn basic_type(&self) -> BasicType {
        match self {
            Self::I64(_) => BasicType::I64,
            Self::U64(_) => BasicType::U64,
            Self::F64(_) => BasicType::F64,
            Self::Decimal(_) => BasicType::Decimal,
            Self::Text => BasicType::String,
        }
    }

    /// Stage the number; `text` is its source span.
    pub(crate) fn stage(self, text: &str, buf: &mut ValueBuffer<'_>) -> Result<()> {
        match self {
            Self::I64(v) => buf.write_i64(v),
            Self::U64(v) => buf.write_u64(v),
            Self::F64(v) => buf.write_f64(v),
            Self::Decimal(v) => buf.write_decimal(v),
            Self::Text => buf.write_string(text),
        }
    }
}

/// Parse a number span. `None` when the span is not a number.
pub(crate) fn parse_number(text: &str) -> Option<ParsedNumber> {
    let bytes = text.as_bytes();
    let mut i = 0;
    let negative = match bytes.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = &bytes[int_start..i];

    let mut frac_digits: &[u8] = &[];
    let mut has_fraction = false;
    if i < bytes.len() && bytes[i] == b'.' {
        has_fraction = true;
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = &bytes[frac_start..i];
    }
    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let mut exponent: i32 = 0;
    let mut has_exponent = false;
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        has_exponent = true;
        i += 1;
        let exp_negative = match bytes.get(i) {
            Some(b'-') => {
                i += 1;
                true
            }
            Some(b'+') => {
                i += 1;
                false
            }
            _ => false,
        };
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            exponent = exponent
                .saturating_mul(10)
                .saturating_add(i32::from(bytes[i] - b'0'));
            i += 1;
        }
        if i == exp_start {
            return None;
        }
        if exp_negative {
            exponent = -exponent;
        }
    }
    if i != bytes.len() {
        return None;
    }

    if !has_fraction && !has_exponent {
        return Some(parse_integer(text, int_digits, negative));
    }

    let significant = significant_digits(int_digits, frac_digits);
    if significant > F64_DIGITS {
        return Some(precise(text, has_exponent, significant));
    }

    // Exact fast path: small mantissa, small power of ten.
    let mut mantissa: u64 = 0;
    let mut exact = true;
    for &d in int_digits.iter().chain(frac_digits) {
        match mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(u64::from(d - b'0')))
        {
            Some(m) => mantissa = m,
            None => {
                exact = false;
                break;
            }
        }
    }
    let exp10 = i64::from(exponent) - frac_digits.len() as i64;
    if exact && mantissa <= MAX_EXACT_MANTISSA && exp10.unsigned_abs() < POW10.len() as u64 {
        let scale = POW10[exp10.unsigned_abs() as usize];
        let magnitude = if exp10 < 0 {
            mantissa as f64 / scale
        } else {
            mantissa as f64 * scale
        };
        return Some(ParsedNumber::F64(if negative { -magnitude } else { magnitude }));
    }

    text.parse::<f64>().ok().map(ParsedNumber::F64)
}

fn parse_integer(text: &str, digits: &[u8], negative: bool) -> ParsedNumber {
    let mut magnitude: u64 = 0;
    for &d in digits {
        match magnitude
            .checked_mul(10)
            .and_then(|m| m.checked_add(u64::from(d - b'0')))
        {
            Some(m) => magnitude = m,
            None => {
                let significant = significant_digits(digits, &[]);
                return precise(text, false, significant);
            }
        }
    }
    if negative && magnitude == 0 {
        // Keeps the sign that `-0` is written with.
        return ParsedNumber::F64(-0.0);
    }
    if negative {
        match i64::try_from(-i128::from(magnitude)) {
            Ok(v) => ParsedNumber::I64(v),
            Err(_) => precise(text, false, significant_digits(digits, &[])),
        }
    } else if let Ok(v) = i64::try_from(magnitude) {
        ParsedNumber::I64(v)
    } else {
        ParsedNumber::U64(magnitude)
    }
}

/// Decimal when it holds every digit, text otherwise.
fn precise(text: &str, has_exponent: bool, significant: usize) -> ParsedNumber {
    if significant > DECIMAL_DIGITS {
        return ParsedNumber::Text;
    }
    let parsed = if has_exponent {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text.trim_start_matches('+'))
    };
    parsed.map_or(ParsedNumber::Text, ParsedNumber::Decimal)
}

fn significant_digits(int_digits: &[u8], frac_digits: &[u8]) -> usize {
    let digits = || int_digits.iter().chain(frac_digits);
    let Some(leading) = digits().position(|&d| d != b'0') else {
        return 0;
    };
    let trailing = digits().rev().position(|&d| d != b'0').unwrap_or(0);
    int_digits.len() + frac_digits.len() - leading - trailing
}
