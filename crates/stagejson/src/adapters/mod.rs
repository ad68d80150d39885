// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`Value`](crate::Value) implementations for std and ecosystem types,
//! plus the structural readers/writers they are built from.

mod collections;
pub mod dynamic;
mod maps;
mod object;
mod option;
mod pointers;
mod primitives;
mod raw;
mod text;

pub use collections::{SliceReader, VecWriter};
pub use maps::{EntryReader, EntryWriter, MapKey};
pub use object::{read_object, write_object, Member, Object, ObjectReader, ObjectWriter};
pub use text::Text;
