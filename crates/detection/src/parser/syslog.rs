//! BSD syslog 파서
//!
//! `/var/log/messages`, `/var/log/syslog` 등에 기록되는 전통적인 syslog 라인을 파싱합니다.
//!
//! # 라인 형식
//! ```text
//! <MON> <DAY> <HH:MM:SS> <HOSTNAME> <PROGRAM>[<PID>]: <MESSAGE>
//! Jan  1 10:30:15 server1 sshd[1234]: Failed password for root
//! ```
//!
//! 타임스탬프에 연도가 없으므로 현재 로컬 연도를 가정합니다.

use std::sync::LazyLock;

use logsieve_core::pipeline::LineParser;
use logsieve_core::types::{LogFormat, LogRecord};
use regex::Regex;

use super::{resolve_pid, timestamp};

static SYSLOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(\S+)\s+(\S+)(?:\[(\d+)\])?:\s*(.*)$",
    )
    .expect("syslog line pattern is valid")
});

/// BSD syslog 라인 파서
#[derive(Debug, Default, Clone, Copy)]
pub struct SyslogParser;

impl SyslogParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl LineParser for SyslogParser {
    fn format(&self) -> LogFormat {
        LogFormat::Syslog
    }

    fn parse_line(&self, line: &str) -> Option<LogRecord> {
        let caps = SYSLOG_LINE.captures(line)?;

        let program = caps.get(3).map_or("", |m| m.as_str());
        let mut record = LogRecord::new(
            LogFormat::Syslog,
            timestamp::from_bsd_current_year(&caps[1]),
        );
        record.hostname = caps[2].to_owned();
        record.pid = resolve_pid(program, caps.get(4).map(|m| m.as_str()));
        record.program = program.to_owned();
        record.message = caps.get(5).map_or("", |m| m.as_str()).to_owned();
        Some(record)
    }
}
