// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML option profiles.
//!
//! # Example YAML
//!
//! ```yaml
//! default_profile: debug
//!
//! profiles:
//!   debug:
//!     indent: "  "
//!     key_separator_pad: " "
//!     reference_mode: marker
//!
//!   wire:
//!     max_depth: 32
//!     depth_policy: truncate
//!     ignore_null: true
//! ```
//!
//! Fields left out of a profile keep their `JsonOptions::default()` value.

use super::JsonOptions;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// YAML option profile loader.
pub struct YamlLoader;

/// Root YAML document structure.
#[derive(Debug, Deserialize)]
pub struct YamlOptionsDocument {
    /// Named option profiles.
    #[serde(default)]
    pub profiles: HashMap<String, JsonOptions>,

    /// Profile used by `get_default_profile`.
    #[serde(default)]
    pub default_profile: Option<String>,
}

impl YamlLoader {
    /// Load option profiles from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<YamlOptionsDocument> {
        let path = path.as_ref();
        log::debug!("[loaders] reading option profiles from {}", path.display());
        let yaml_content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read YAML file: {}", e)))?;
        Self::parse_yaml(&yaml_content)
    }

    /// Parse YAML content.
    pub fn parse_yaml(yaml_content: &str) -> Result<YamlOptionsDocument> {
        serde_yaml::from_str(yaml_content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {}", e)))
    }

    /// Options by profile name.
    pub fn get_profile(doc: &YamlOptionsDocument, name: &str) -> Result<JsonOptions> {
        doc.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Config(format!("Profile '{}' not found", name)))
    }

    /// The document's default profile, else its only profile, else defaults.
    pub fn get_default_profile(doc: &YamlOptionsDocument) -> Result<JsonOptions> {
        if let Some(ref default_name) = doc.default_profile {
            Self::get_profile(doc, default_name)
        } else if doc.profiles.len() == 1 {
            Ok(doc.profiles.values().next().cloned().unwrap_or_default())
        } else {
            Ok(JsonOptions::default())
        }
    }

    /// Load `name` (or the default profile) straight from a file.
    pub fn load_options<P: AsRef<Path>>(path: P, name: Option<&str>) -> Result<JsonOptions> {
        let doc = Self::load_from_file(path)?;
        match name {
            Some(name) => Self::get_profile(&doc, name),
            None => Self::get_default_profile(&doc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{DepthPolicy, ReferenceMode};
    use std::io::Write;

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
profiles:
  test:
    ignore_null: true
"#;

        let doc = YamlLoader::parse_yaml(yaml).expect("valid YAML should parse");
        let opts = YamlLoader::get_profile(&doc, "test").expect("profile should exist");
        assert!(opts.ignore_null);
        assert!(!opts.ignore_zero);
        assert_eq!(opts.max_depth, crate::json::DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_parse_full_profile() {
        let yaml = r#"
default_profile: wire

profiles:
  debug:
    indent: "    "
    reference_mode: marker
  wire:
    max_depth: 8
    depth_policy: truncate
    reference_mode: null_on_repeat
    strict_members: true
"#;

        let doc = YamlLoader::parse_yaml(yaml).expect("valid YAML should parse");
        let opts = YamlLoader::get_default_profile(&doc).expect("default profile should exist");
        assert_eq!(opts.max_depth, 8);
        assert_eq!(opts.depth_policy, DepthPolicy::Truncate);
        assert_eq!(opts.reference_mode, ReferenceMode::NullOnRepeat);
        assert!(opts.strict_members);

        let debug = YamlLoader::get_profile(&doc, "debug").expect("debug profile should exist");
        assert_eq!(debug.indent.as_deref(), Some("    "));
        assert_eq!(debug.reference_mode, ReferenceMode::Marker);
    }

    #[test]
    fn test_unknown_profile_and_bad_yaml() {
        let doc = YamlLoader::parse_yaml("profiles: {}").expect("empty profiles parse");
        assert!(matches!(
            YamlLoader::get_profile(&doc, "missing"),
            Err(Error::Config(_))
        ));
        assert_eq!(
            YamlLoader::get_default_profile(&doc).expect("defaults"),
            JsonOptions::default()
        );

        assert!(matches!(
            YamlLoader::parse_yaml("profiles: [1, 2"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "profiles:\n  only:\n    ignore_empty: true").expect("write profile");

        let opts = YamlLoader::load_options(file.path(), None).expect("profile loads");
        assert!(opts.ignore_empty);

        assert!(matches!(
            YamlLoader::load_from_file("/nonexistent/stagejson.yaml"),
            Err(Error::Config(_))
        ));
    }
}
