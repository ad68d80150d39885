// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec options.

use crate::contracts::MemberPolicy;

#[cfg(feature = "config-loaders")]
use serde::{Deserialize, Serialize};

/// Default nesting limit for both directions.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What the serializer does when it meets a structure it already emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-loaders", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "snake_case"))]
pub enum ReferenceMode {
    /// Re-expand every visit. Cyclic input is stopped by the depth guard.
    #[default]
    None,
    /// Later visits of the same identity are written as `null`.
    NullOnRepeat,
    /// Later visits are written as `ref_<n>`, `n` counting first visits
    /// from 0. The deserializer resolves the marker back to the instance.
    Marker,
}

/// What the serializer does past `max_depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config-loaders", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "snake_case"))]
pub enum DepthPolicy {
    /// Fail with `Error::DepthExceeded`.
    #[default]
    Raise,
    /// Write `null` instead of the structure that would exceed the limit.
    Truncate,
}

/// Options shared by the serializer and the deserializer.
///
/// # Example
///
/// ```
/// use stagejson::json::{JsonOptions, ReferenceMode};
///
/// let opts = JsonOptions::pretty()
///     .with_reference_mode(ReferenceMode::Marker)
///     .ignore_all();
/// assert_eq!(opts.indent.as_deref(), Some("  "));
/// assert!(opts.ignore_null && opts.ignore_zero && opts.ignore_empty);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-loaders", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(default))]
pub struct JsonOptions {
    pub reference_mode: ReferenceMode,
    /// Deepest structure nesting allowed; the top-level structure is depth 1.
    pub max_depth: usize,
    pub depth_policy: DepthPolicy,
    /// Per-level indent. `None` writes compact output.
    pub indent: Option<String>,
    /// Written before each key/element and closing bracket when indenting.
    pub line_break: String,
    /// Written after each `:`.
    pub key_separator_pad: String,
    /// Skip null members.
    pub ignore_null: bool,
    /// Skip numeric zero members.
    pub ignore_zero: bool,
    /// Skip empty-string members.
    pub ignore_empty: bool,
    /// Apply the ignore-* filters to array elements too.
    pub filter_array_elements: bool,
    /// Unknown keys fail the decode instead of being skipped.
    pub strict_members: bool,
    /// Inaccessible members fail instead of being skipped.
    pub strict_access: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            reference_mode: ReferenceMode::None,
            max_depth: DEFAULT_MAX_DEPTH,
            depth_policy: DepthPolicy::Raise,
            indent: None,
            line_break: "\n".to_string(),
            key_separator_pad: String::new(),
            ignore_null: false,
            ignore_zero: false,
            ignore_empty: false,
            filter_array_elements: false,
            strict_members: false,
            strict_access: false,
        }
    }
}

impl JsonOptions {
    /// Compact output, no filters, no reference tracking.
    pub fn compact() -> Self {
        Self::default()
    }

    /// Two-space indent with a space after `:`.
    pub fn pretty() -> Self {
        Self {
            indent: Some("  ".to_string()),
            key_separator_pad: " ".to_string(),
            ..Self::default()
        }
    }

    pub fn with_reference_mode(mut self, mode: ReferenceMode) -> Self {
        self.reference_mode = mode;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_depth_policy(mut self, policy: DepthPolicy) -> Self {
        self.depth_policy = policy;
        self
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = Some(indent.into());
        self
    }

    pub fn with_line_break(mut self, line_break: impl Into<String>) -> Self {
        self.line_break = line_break.into();
        self
    }

    pub fn with_key_separator_pad(mut self, pad: impl Into<String>) -> Self {
        self.key_separator_pad = pad.into();
        self
    }

    pub fn ignore_null(mut self, on: bool) -> Self {
        self.ignore_null = on;
        self
    }

    pub fn ignore_zero(mut self, on: bool) -> Self {
        self.ignore_zero = on;
        self
    }

    pub fn ignore_empty(mut self, on: bool) -> Self {
        self.ignore_empty = on;
        self
    }

    pub fn filter_array_elements(mut self, on: bool) -> Self {
        self.filter_array_elements = on;
        self
    }

    /// All four filter switches on.
    pub fn ignore_all(self) -> Self {
        self.ignore_null(true)
            .ignore_zero(true)
            .ignore_empty(true)
            .filter_array_elements(true)
    }

    pub fn strict(mut self) -> Self {
        self.strict_members = true;
        self.strict_access = true;
        self
    }

    /// Policy object adapters apply while this codec drives them.
    pub fn member_policy(&self) -> MemberPolicy {
        MemberPolicy {
            strict_members: self.strict_members,
            strict_access: self.strict_access,
        }
    }

    /// Whether object members go through the filter at all.
    pub(crate) fn filters_members(&self) -> bool {
        self.ignore_null || self.ignore_zero || self.ignore_empty
    }

    /// Whether array elements go through the filter.
    pub(crate) fn filters_elements(&self) -> bool {
        self.filter_array_elements && self.filters_members()
    }
}
