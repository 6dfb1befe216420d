#![no_main]
use libfuzzer_sys::fuzz_target;

use mcp_flexstay::domain::quote::{parse_price, strip_year};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_price(text);
        let _ = strip_year(text);
    }
});
