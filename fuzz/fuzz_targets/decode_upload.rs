// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;

use plantpal::advisor::parse_health_response;
use plantpal::analysis::{decode_image, encode_for_model};

fuzz_target!(|data: &[u8]| {
    // Uploads come straight from users
    let _ = decode_image(data);
    assert!(!encode_for_model(data).is_empty() || data.is_empty());

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_health_response(text);
    }
});
