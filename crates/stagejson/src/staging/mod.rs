// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value staging.
//!
//! A [`ValueBuffer`] decouples the producer of a value from its consumer:
//! the producer writes one value into it, the consumer later reads or replays
//! it. [`KeyedBuffer`] adds a destination slot so a member or element and a
//! free value look the same to producers.

mod buffer;
mod keyed;

pub use buffer::ValueBuffer;
pub use keyed::KeyedBuffer;
