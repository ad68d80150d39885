// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use stagejson::json::{self, JsonOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Compact output of valid input is a fixed point
    let opts = JsonOptions::compact();
    if let Ok(once) = json::reformat(text, &opts) {
        let twice = json::reformat(&once, &opts).expect("reformatted output must parse");
        assert_eq!(once, twice);
    }
});
