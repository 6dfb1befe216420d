#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(html) = std::str::from_utf8(data) {
        if let Ok(month) = mcp_flexstay::adapters::webdriver::page_parser::parse_displayed_month(html) {
            let _ = month.year_month();
            let _ = month.next_month_origin();
        }
    }
});
