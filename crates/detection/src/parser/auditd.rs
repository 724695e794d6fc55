//! auditd 로그 파서
//!
//! Linux audit 서브시스템의 key=value 형식 라인을 파싱합니다.
//!
//! # 라인 형식
//! ```text
//! type=<TYPE> msg=audit(<EPOCH>.<FRAC>:<SERIAL>): <key=value ...>
//! type=SYSCALL msg=audit(1640999999.123:456): arch=c000003e syscall=open success=yes
//! ```
//!
//! 호스트명이 없으므로 [`PLACEHOLDER_HOSTNAME`]을 사용하고,
//! 프로그램명은 `auditd`로 고정됩니다. pid에는 audit 이벤트 serial이 들어갑니다.

use std::sync::LazyLock;

use logsieve_core::pipeline::LineParser;
use logsieve_core::types::{LogFormat, LogRecord, PLACEHOLDER_HOSTNAME};
use regex::Regex;

use super::timestamp;

/// audit 레코드의 프로그램명
pub const AUDIT_PROGRAM: &str = "auditd";

static AUDIT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^type=(\S+)\s+msg=audit\((\d+\.\d+):(\d+)\):\s*(.*)$")
        .expect("audit line pattern is valid")
});

static AUDIT_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)=(\S+)").expect("audit field pattern is valid"));

/// auditd 라인 파서
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditdParser;

impl AuditdParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl LineParser for AuditdParser {
    fn format(&self) -> LogFormat {
        LogFormat::Auditd
    }

    fn parse_line(&self, line: &str) -> Option<LogRecord> {
        let caps = AUDIT_LINE.captures(line)?;

        let rest = caps.get(4).map_or("", |m| m.as_str());
        let mut record = LogRecord::new(LogFormat::Auditd, timestamp::from_epoch(&caps[2]));
        record.hostname = PLACEHOLDER_HOSTNAME.to_owned();
        record.program = AUDIT_PROGRAM.to_owned();
        record.pid = caps[3].to_owned();
        record.message = rest.to_owned();

        record.fields.insert("type".to_owned(), caps[1].to_owned());
        // 같은 키가 반복되면 마지막 값이 남습니다
        for field in AUDIT_FIELD.captures_iter(rest) {
            record
                .fields
                .insert(field[1].to_owned(), field[2].to_owned());
        }

        Some(record)
    }
}
