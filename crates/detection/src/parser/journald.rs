//! journald 텍스트 출력 파서
//!
//! `journalctl -o short-iso` 계열의 출력처럼 RFC 3339 타임스탬프로 시작하는 라인을 파싱합니다.
//!
//! # 라인 형식
//! ```text
//! <RFC3339> <HOSTNAME> <PROGRAM>[<PID>]: <MESSAGE>
//! 2025-01-01T10:30:15Z server1 systemd[1]: Started Network Manager
//! ```

use std::sync::LazyLock;

use logsieve_core::pipeline::LineParser;
use logsieve_core::types::{LogFormat, LogRecord};
use regex::Regex;

use super::{resolve_pid, timestamp};

static JOURNALD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:\d{2})?)\s+(\S+)\s+(\S+)(?:\[(\d+)\])?:\s*(.*)$",
    )
    .expect("journald line pattern is valid")
});

/// journald 라인 파서
#[derive(Debug, Default, Clone, Copy)]
pub struct JournaldParser;

impl JournaldParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl LineParser for JournaldParser {
    fn format(&self) -> LogFormat {
        LogFormat::Journald
    }

    fn parse_line(&self, line: &str) -> Option<LogRecord> {
        let caps = JOURNALD_LINE.captures(line)?;

        let program = caps.get(3).map_or("", |m| m.as_str());
        let mut record = LogRecord::new(
            LogFormat::Journald,
            timestamp::from_rfc3339_like(&caps[1]),
        );
        record.hostname = caps[2].to_owned();
        record.pid = resolve_pid(program, caps.get(4).map(|m| m.as_str()));
        record.program = program.to_owned();
        record.message = caps.get(5).map_or("", |m| m.as_str()).to_owned();
        Some(record)
    }
}
