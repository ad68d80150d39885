// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scalar conversion rules shared by every reader.
//!
//! numeric <-> numeric and numeric <-> bool convert, strings parse with
//! `str::parse` (no locale), everything else is a type mismatch.

use super::BasicType;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Float to integer: must be finite; rounds half to even; range-checked.
pub(crate) fn f64_to_integer<T: TryFrom<i128>>(
    value: f64,
    expected: &'static str,
    found: BasicType,
) -> Result<T> {
    if !value.is_finite() {
        return Err(Error::mismatch(expected, found));
    }
    let rounded = value.round_ties_even();
    if rounded < i128::MIN as f64 || rounded > i128::MAX as f64 {
        return Err(Error::mismatch(expected, found));
    }
    T::try_from(rounded as i128).map_err(|_| Error::mismatch(expected, found))
}

pub(crate) fn decimal_to_integer<T: TryFrom<i128>>(
    value: Decimal,
    expected: &'static str,
) -> Result<T> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_i128()
        .and_then(|v| T::try_from(v).ok())
        .ok_or(Error::mismatch(expected, BasicType::Decimal))
}

pub(crate) fn decimal_from_f64(value: f64, found: BasicType) -> Result<Decimal> {
    Decimal::try_from(value).map_err(|_| Error::mismatch("decimal", found))
}

/// Parse trimmed text into any `FromStr` scalar.
pub(crate) fn parse_scalar<T: FromStr>(text: &str, expected: &'static str) -> Result<T> {
    text.trim()
        .parse::<T>()
        .map_err(|_| Error::mismatch(expected, BasicType::String))
}

pub(crate) fn decimal_from_str(text: &str) -> Result<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| Error::mismatch("decimal", BasicType::String))
}

/// `true`/`false` in any case, or `1`/`0`.
pub(crate) fn bool_from_str(text: &str) -> Result<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") || text == "1" {
        Ok(true)
    } else if text.eq_ignore_ascii_case("false") || text == "0" {
        Ok(false)
    } else {
        Err(Error::mismatch("bool", BasicType::String))
    }
}

/// Exactly one character.
pub(crate) fn char_from_str(text: &str) -> Result<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::mismatch("char", BasicType::String)),
    }
}

/// RFC 3339, then a zone-less timestamp (taken as UTC), then a bare date.
pub(crate) fn datetime_from_str(text: &str) -> Result<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc().fixed_offset());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    Err(Error::mismatch("datetime", BasicType::String))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_to_integer_rounds_half_even() {
        assert_eq!(f64_to_integer::<i32>(2.5, "i32", BasicType::F64).unwrap(), 2);
        assert_eq!(f64_to_integer::<i32>(3.5, "i32", BasicType::F64).unwrap(), 4);
        assert_eq!(f64_to_integer::<i32>(-1.2, "i32", BasicType::F64).unwrap(), -1);
    }

    #[test]
    fn test_float_to_integer_range_checked() {
        assert!(f64_to_integer::<u8>(256.0, "u8", BasicType::F64).is_err());
        assert!(f64_to_integer::<u8>(-1.0, "u8", BasicType::F64).is_err());
        assert!(f64_to_integer::<i64>(f64::NAN, "i64", BasicType::F64).is_err());
        assert!(f64_to_integer::<i64>(f64::INFINITY, "i64", BasicType::F64).is_err());
    }

    #[test]
    fn test_parse_scalar_is_invariant() {
        assert_eq!(parse_scalar::<i32>(" 42 ", "i32").unwrap(), 42);
        assert!(parse_scalar::<i32>("4,2", "i32").is_err());
        assert_eq!(parse_scalar::<f64>("1.5e3", "f64").unwrap(), 1500.0);
    }

    #[test]
    fn test_bool_from_str() {
        assert!(bool_from_str("TRUE").unwrap());
        assert!(!bool_from_str("0").unwrap());
        assert!(bool_from_str("yes").is_err());
    }

    #[test]
    fn test_datetime_forms() {
        let full = datetime_from_str("2024-03-01T12:30:00+02:00").unwrap();
        assert_eq!(full.offset().local_minus_utc(), 7200);

        let naive = datetime_from_str("2024-03-01T12:30:00").unwrap();
        assert_eq!(naive.offset().local_minus_utc(), 0);

        let date = datetime_from_str("2024-03-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        assert!(datetime_from_str("yesterday").is_err());
    }

    #[test]
    fn test_decimal_conversions() {
        let d = decimal_from_str("12.5").unwrap();
        assert_eq!(decimal_to_integer::<i64>(d, "i64").unwrap(), 12);
        assert_eq!(decimal_from_str("1e3").unwrap(), Decimal::from(1000));
        assert!(decimal_from_f64(f64::NAN, BasicType::F64).is_err());
    }
}
