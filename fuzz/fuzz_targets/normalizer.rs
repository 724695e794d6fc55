#![no_main]

use libfuzzer_sys::fuzz_target;
use logsieve_core::types::LogFormat;
use logsieve_detection::parser::LogNormalizer;

fuzz_target!(|data: &[u8]| {
    for format in LogFormat::ALL {
        let records = LogNormalizer::new(format).normalize_bytes(data);
        for record in &records {
            assert_eq!(record.service, format.service());
        }
    }
});
