//! 로그 정규화 모듈 -- syslog, journald, auditd 라인을 [`LogRecord`]로 변환
//!
//! [`LogNormalizer`]는 형식 하나에 대응하는 [`LineParser`]를 골라 입력 전체를 라인 단위로
//! 처리합니다. 파서가 인식하지 못한 라인은 직전 레코드 메시지의 연속(continuation)으로
//! 간주되어 공백 하나와 함께 덧붙여집니다.
//!
//! # 지원 형식
//! - BSD syslog ([`SyslogParser`])
//! - journald 텍스트 출력 ([`JournaldParser`])
//! - auditd ([`AuditdParser`])
//!
//! # 사용 예시
//! ```ignore
//! use logsieve_core::types::LogFormat;
//! use logsieve_detection::parser::LogNormalizer;
//!
//! let normalizer = LogNormalizer::new(LogFormat::Syslog);
//! let records = normalizer.normalize_file("/var/log/messages").await?;
//! ```

pub mod auditd;
pub mod journald;
pub mod syslog;
pub mod timestamp;

pub use auditd::AuditdParser;
pub use journald::JournaldParser;
pub use syslog::SyslogParser;

use std::io::BufRead;
use std::path::Path;

use logsieve_core::metrics as m;
use logsieve_core::pipeline::LineParser;
use logsieve_core::types::{LogFormat, LogRecord};

use crate::error::EngineError;

/// 형식별 파서를 생성합니다.
pub fn parser_for(format: LogFormat) -> Box<dyn LineParser> {
    match format {
        LogFormat::Syslog => Box::new(SyslogParser::new()),
        LogFormat::Journald => Box::new(JournaldParser::new()),
        LogFormat::Auditd => Box::new(AuditdParser::new()),
    }
}

/// 프로그램 토큰과 대괄호 캡처에서 pid를 결정합니다.
///
/// 캡처가 있으면 그대로 사용하고, 없으면 프로그램 토큰 끝의 `[digits]`에서 추출합니다.
pub(crate) fn resolve_pid(program: &str, captured: Option<&str>) -> String {
    if let Some(pid) = captured {
        return pid.to_owned();
    }
    program
        .strip_suffix(']')
        .and_then(|rest| rest.rsplit_once('['))
        .map(|(_, digits)| digits)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or_default()
        .to_owned()
}

/// 라인 단위 처리 통계 (호출 한 번 단위로 집계 후 메트릭에 반영)
#[derive(Debug, Default)]
struct LineStats {
    normalized: u64,
    continued: u64,
    dropped: u64,
}

/// 형식 하나에 대한 로그 정규화기
pub struct LogNormalizer {
    parser: Box<dyn LineParser>,
}

impl LogNormalizer {
    /// 지정한 형식의 기본 파서로 정규화기를 생성합니다.
    pub fn new(format: LogFormat) -> Self {
        Self {
            parser: parser_for(format),
        }
    }

    /// 직접 구현한 파서로 정규화기를 생성합니다.
    pub fn with_parser(parser: Box<dyn LineParser>) -> Self {
        Self { parser }
    }

    /// 이 정규화기가 처리하는 형식
    pub fn format(&self) -> LogFormat {
        self.parser.format()
    }

    /// 리더를 끝까지 읽어 레코드 목록을 만듭니다.
    ///
    /// 읽기 도중 I/O 에러가 나면 [`EngineError::FileAccess`]를 반환합니다.
    pub fn normalize_reader<R: BufRead>(&self, mut reader: R) -> Result<Vec<LogRecord>, EngineError> {
        let mut records = Vec::new();
        let mut stats = LineStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| EngineError::FileAccess {
                    path: "<reader>".to_owned(),
                    reason: e.to_string(),
                })?;
            if read == 0 {
                break;
            }
            self.push_line(&buf, &mut records, &mut stats);
        }

        self.record_stats(&stats);
        Ok(records)
    }

    /// 메모리 상의 바이트열을 정규화합니다.
    pub fn normalize_bytes(&self, data: &[u8]) -> Vec<LogRecord> {
        let mut records = Vec::new();
        let mut stats = LineStats::default();

        for line in data.split(|&b| b == b'\n') {
            self.push_line(line, &mut records, &mut stats);
        }

        self.record_stats(&stats);
        records
    }

    /// 파일 하나를 읽어 정규화합니다.
    ///
    /// 파일이 없거나 읽을 수 없으면 경로를 담은 [`EngineError::FileAccess`]를 반환합니다.
    pub async fn normalize_file(&self, path: impl AsRef<Path>) -> Result<Vec<LogRecord>, EngineError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| EngineError::FileAccess {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let records = self.normalize_bytes(&data);
        tracing::debug!(
            path = %path.display(),
            format = %self.format(),
            records = records.len(),
            "log file normalized"
        );
        Ok(records)
    }

    fn push_line(&self, raw: &[u8], records: &mut Vec<LogRecord>, stats: &mut LineStats) {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        if line.is_empty() {
            return;
        }

        if let Some(record) = self.parser.parse_line(&line) {
            records.push(record);
            stats.normalized += 1;
            return;
        }

        match records.last_mut() {
            Some(previous) => {
                previous.append_continuation(&line);
                stats.continued += 1;
            }
            None => {
                tracing::debug!(format = %self.format(), line = %line, "dropping line without preceding record");
                stats.dropped += 1;
            }
        }
    }

    fn record_stats(&self, stats: &LineStats) {
        let format = self.format().as_str();
        if stats.normalized > 0 {
            metrics::counter!(m::RECORDS_NORMALIZED_TOTAL, m::LABEL_FORMAT => format)
                .increment(stats.normalized);
        }
        if stats.continued > 0 {
            metrics::counter!(m::LINES_CONTINUED_TOTAL, m::LABEL_FORMAT => format)
                .increment(stats.continued);
        }
        if stats.dropped > 0 {
            metrics::counter!(m::LINES_DROPPED_TOTAL, m::LABEL_FORMAT => format)
                .increment(stats.dropped);
        }
    }
}

impl std::fmt::Debug for LogNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogNormalizer")
            .field("format", &self.format())
            .finish()
    }
}
