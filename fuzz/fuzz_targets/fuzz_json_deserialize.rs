// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use stagejson::adapters::dynamic::DynamicValue;
use stagejson::json::{self, JsonOptions, ReferenceMode};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Untyped decode, then the output must decode again to the same value
    if let Ok(value) = json::deserialize::<DynamicValue>(text) {
        if let Ok(encoded) = json::serialize(&value) {
            let again = json::deserialize::<DynamicValue>(&encoded);
            assert!(again.is_ok(), "re-decode failed for {:?}", encoded);
        }
    }

    // Typed decodes exercise the conversion paths
    let _ = json::deserialize::<Vec<Option<i64>>>(text);
    let _ = json::deserialize::<Vec<String>>(text);

    let opts = JsonOptions::pretty()
        .with_reference_mode(ReferenceMode::Marker)
        .with_max_depth(16);
    let _ = json::reformat(text, &opts);
});
