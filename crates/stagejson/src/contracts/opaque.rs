// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pass-through values.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A value carried through staging without interpretation.
///
/// Codecs only understand the payloads they know about (the JSON codec
/// understands [`RawJson`]); anything else is rejected at emission time.
#[derive(Clone)]
pub struct Opaque {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Verbatim JSON text, if this opaque value carries some.
    pub fn as_raw_json(&self) -> Option<&str> {
        self.downcast_ref::<RawJson>().map(|raw| raw.0.as_str())
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        match (self.as_raw_json(), other.as_raw_json()) {
            (Some(a), Some(b)) => a == b,
            _ => Arc::ptr_eq(&self.value, &other.value),
        }
    }
}

/// Verbatim JSON fragment.
///
/// Decoding captures the source text of one value; encoding splices it back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawJson(pub String);

impl RawJson {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_downcast() {
        let opaque = Opaque::new(RawJson("[1,2]".into()));
        assert_eq!(opaque.as_raw_json(), Some("[1,2]"));
        assert!(opaque.downcast_ref::<u32>().is_none());
        assert!(opaque.type_name().ends_with("RawJson"));
    }

    #[test]
    fn test_opaque_equality() {
        let a = Opaque::new(RawJson("1".into()));
        let b = Opaque::new(RawJson("1".into()));
        assert_eq!(a, b);

        let c = Opaque::new(7u8);
        assert_eq!(c, c.clone());
        assert_ne!(c, Opaque::new(7u8));
    }
}
