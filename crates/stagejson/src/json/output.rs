// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Growable text buffer the serializer writes into.

use std::cell::RefCell;

/// Buffers kept per thread for reuse.
const POOL_LIMIT: usize = 4;
/// Buffers that grew past this are dropped instead of pooled.
const POOL_MAX_CAPACITY: usize = 1 << 20;
const INITIAL_CAPACITY: usize = 256;

thread_local! {
    static POOL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Owned output buffer.
///
/// Invariant: `len() <= capacity()`; when a write does not fit, capacity
/// becomes `3 * capacity + requested` so repeated small writes stay amortized.
#[derive(Debug)]
pub(crate) struct OutputBuffer {
    text: String,
}

impl OutputBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
        }
    }

    /// Take a cleared buffer from this thread's pool, or allocate one.
    pub(crate) fn acquire() -> Self {
        let pooled = POOL.with(|pool| pool.borrow_mut().pop());
        match pooled {
            Some(mut text) => {
                text.clear();
                Self { text }
            }
            None => Self::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Hand the allocation back to this thread's pool.
    pub(crate) fn release(mut self) {
        if self.text.capacity() > POOL_MAX_CAPACITY {
            return;
        }
        self.text.clear();
        POOL.with(|pool| {
            let mut pool = pool.borrow_mut();
            if pool.len() < POOL_LIMIT {
                pool.push(std::mem::take(&mut self.text));
            }
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.text.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.text.capacity()
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.text
    }

    /// Make room for `additional` more bytes.
    #[inline]
    pub(crate) fn reserve(&mut self, additional: usize) {
        let needed = self.text.len() + additional;
        if needed > self.text.capacity() {
            let target = self.text.capacity() * 3 + additional;
            self.text.reserve_exact(target - self.text.len());
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, ch: char) {
        self.reserve(ch.len_utf8());
        self.text.push(ch);
    }

    #[inline]
    pub(crate) fn push_str(&mut self, s: &str) {
        self.reserve(s.len());
        self.text.push_str(s);
    }

    /// Drop one trailing `,`. Never touches any other character, so an
    /// empty structure keeps its opening bracket.
    pub(crate) fn retract_separator(&mut self) -> bool {
        if self.text.ends_with(',') {
            self.text.pop();
            true
        } else {
            false
        }
    }

    pub(crate) fn last_char(&self) -> Option<char> {
        self.text.chars().next_back()
    }

    /// Cut back to `len` bytes, which must sit on a char boundary.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.text.truncate(len);
    }
}

impl std::fmt::Write for OutputBuffer {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_is_triple_plus_requested() {
        let mut out = OutputBuffer::with_capacity(4);
        out.push_str("abcd");
        let before = out.capacity();
        out.push_str("efghij");
        assert!(out.capacity() >= before * 3 + 6);
        assert_eq!(out.as_str(), "abcdefghij");
    }

    #[test]
    fn test_retract_only_drops_separator() {
        let mut out = OutputBuffer::with_capacity(8);
        out.push('[');
        assert!(!out.retract_separator());
        assert_eq!(out.as_str(), "[");
        out.push_str("1,");
        assert!(out.retract_separator());
        assert_eq!(out.as_str(), "[1");
        assert_eq!(out.last_char(), Some('1'));
    }

    #[test]
    fn test_pool_hands_back_cleared_buffers() {
        let mut out = OutputBuffer::acquire();
        out.push_str("leftover");
        out.release();
        let again = OutputBuffer::acquire();
        assert_eq!(again.len(), 0);
        assert!(again.capacity() >= INITIAL_CAPACITY.min(8));
    }
}
