#![no_main]

use libfuzzer_sys::fuzz_target;
use logsieve_core::pipeline::LineParser;
use logsieve_detection::parser::AuditdParser;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        let parser = AuditdParser::new();
        if let Some(record) = parser.parse_line(line) {
            // type은 항상 fields에 존재
            assert!(record.fields.contains_key("type"));
        }
    }
});
