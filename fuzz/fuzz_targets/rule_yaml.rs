#![no_main]

use libfuzzer_sys::fuzz_target;
use logsieve_core::types::{LogFormat, LogRecord};
use logsieve_detection::rule::RuleLoader;

fuzz_target!(|data: &[u8]| {
    // YAML 파서는 &str을 받으므로 UTF-8 변환 필요
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        if let Ok(rule) = RuleLoader::parse_yaml(yaml_str, "fuzz-input.yml") {
            let record = LogRecord::new(LogFormat::Syslog, "2025-01-01T00:00:00.000");
            let _ = rule.matches(&record);
        }
    }
});
