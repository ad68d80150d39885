// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # stagejson - type-driven value staging and dispatch
//!
//! Values move between producers and consumers through a small set of
//! capability contracts instead of through a fixed data model. A type
//! describes how it writes itself to a [`ValueWriter`] and reads itself back
//! from a [`ValueReader`]; codecs, containers and the staging buffer all speak
//! the same contracts, so any source can feed any sink.
//!
//! ## Quick Start
//!
//! ```rust
//! use stagejson::json;
//!
//! #[derive(Debug, Default, PartialEq, stagejson::Value)]
//! struct Reading {
//!     sensor: String,
//!     #[value(rename = "v")]
//!     value: f64,
//!     tags: Vec<String>,
//! }
//!
//! let reading = Reading {
//!     sensor: "t1".into(),
//!     value: 21.5,
//!     tags: vec!["lab".into()],
//! };
//! let text = json::serialize(&reading)?;
//! assert_eq!(text, r#"{"sensor":"t1","v":21.5,"tags":["lab"]}"#);
//! assert_eq!(json::deserialize::<Reading>(&text)?, reading);
//! # Ok::<(), stagejson::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   json: Serializer / Deserializer / JsonFormatter / JsonOptions     |
//! +---------------------------------------------------------------------+
//! |   dispatch: Value, Registry (per-type strategies, targeted overrides)|
//! +---------------------------------------------------------------------+
//! |   adapters: scalars, Option, Vec/arrays, maps, derived objects,     |
//! |             Rc<RefCell<T>> graphs, DynamicValue, Text<T>, RawJson   |
//! +---------------------------------------------------------------------+
//! |   staging: ValueBuffer, KeyedBuffer        idcache: IdCache         |
//! +---------------------------------------------------------------------+
//! |   contracts: ValueReader / ValueWriter, Sequence*/Map* traits       |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`contracts`] - reader/writer capability traits and [`BasicType`]
//! - [`staging`] - the tagged-union [`ValueBuffer`]
//! - [`dispatch`] - [`Value`], strategies and the global [`Registry`]
//! - [`adapters`] - contract implementations for std and derived types
//! - [`json`] - the JSON text codec
//! - [`idcache`] - identity-keyed hash table used for cycle tracking

// Allow the derive macro to work inside this crate's tests
extern crate self as stagejson;

/// Contract implementations for std types, derived structs and dynamic values.
pub mod adapters;
/// Reader/writer capability contracts.
pub mod contracts;
/// Per-type strategy resolution and targeted overrides.
pub mod dispatch;
mod error;
/// Identity-keyed hash table.
pub mod idcache;
/// JSON serializer, deserializer and options.
pub mod json;
/// Staging buffers.
pub mod staging;

pub use contracts::{BasicType, MemberPolicy, ValueReader, ValueWriter};
pub use dispatch::{Registry, TypeKey, Value};
pub use error::{AccessKind, Error, ParseError, ParseErrorKind, Result};
pub use staging::ValueBuffer;

// The derive shares the trait's name; `stagejson::Value` resolves to either.
pub use stagejson_codegen::Value;

/// stagejson version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
