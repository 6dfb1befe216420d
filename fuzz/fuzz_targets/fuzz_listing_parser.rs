#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(html) = std::str::from_utf8(data) {
        let _ = mcp_flexstay::adapters::webdriver::page_parser::parse_listing_cards(
            html,
            "https://www.airbnb.com/s/homes",
        );
    }
});
