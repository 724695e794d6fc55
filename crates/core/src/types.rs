//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 정규화된 로그 레코드와 로그 형식, 규칙 심각도를 정의합니다.
//! 모든 형식의 파서는 [`LogRecord`]를 생성하고, 탐지 엔진은 이를 소비합니다.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// 정규화된 타임스탬프 형식 (chrono/strftime 표기)
///
/// 모든 형식의 레코드가 이 형식을 사용하므로 문자열 비교만으로 정렬이 가능합니다.
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// 호스트명이 없는 형식(auditd)에서 사용하는 자리표시자
pub const PLACEHOLDER_HOSTNAME: &str = "localhost";

/// 지원하는 로그 형식
///
/// 각 형식은 고정된 분류 삼중항(category, product, service)을 가집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// BSD syslog (`Jan  2 15:04:05 host prog[pid]: msg`)
    Syslog,
    /// journald 텍스트 출력 (`2025-01-01T10:30:15Z host prog[pid]: msg`)
    Journald,
    /// auditd (`type=SYSCALL msg=audit(1640999999.123:456): ...`)
    Auditd,
}

impl LogFormat {
    /// 지원하는 모든 형식
    pub const ALL: [LogFormat; 3] = [Self::Syslog, Self::Journald, Self::Auditd];

    /// 형식 이름 (설정 파일 및 service 태그와 동일)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syslog => "syslog",
            Self::Journald => "journald",
            Self::Auditd => "auditd",
        }
    }

    /// 분류 삼중항의 category
    pub fn category(&self) -> &'static str {
        match self {
            Self::Syslog | Self::Journald => "process",
            Self::Auditd => "audit",
        }
    }

    /// 분류 삼중항의 product
    pub fn product(&self) -> &'static str {
        "linux"
    }

    /// 분류 삼중항의 service (형식 식별 태그)
    pub fn service(&self) -> &'static str {
        self.as_str()
    }

    /// 이 형식의 관례적인 로그 파일 경로
    pub fn default_path(&self) -> &'static str {
        match self {
            Self::Syslog => "/var/log/messages",
            Self::Journald => "/var/log/journal",
            Self::Auditd => "/var/log/audit/audit.log",
        }
    }
}

impl FromStr for LogFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "syslog" => Ok(Self::Syslog),
            "journald" => Ok(Self::Journald),
            "auditd" => Ok(Self::Auditd),
            other => Err(ParseError::UnsupportedFormat(other.to_owned())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 정규화된 로그 레코드
///
/// 원본 형식과 무관하게 동일한 구조를 가집니다.
/// `timestamp`는 항상 [`CANONICAL_TIMESTAMP_FORMAT`] 형식이며,
/// 분류 삼중항(category/product/service)은 항상 채워져 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// 정규화된 타임스탬프 (`YYYY-MM-DDTHH:MM:SS.mmm`)
    pub timestamp: String,
    /// 호스트명
    pub hostname: String,
    /// 프로그램명 (캡처된 `[pid]` 토큰 포함)
    pub program: String,
    /// 프로세스 ID (없으면 빈 문자열)
    pub pid: String,
    /// 로그 메시지 (연속 라인은 공백으로 이어붙임)
    pub message: String,
    /// 분류: category
    pub category: String,
    /// 분류: product
    pub product: String,
    /// 분류: service
    pub service: String,
    /// 형식별 추가 필드
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// 매칭된 규칙 ID 목록 (평가 전에는 비어 있음)
    #[serde(default)]
    pub matched_rules: Vec<String>,
}

impl LogRecord {
    /// 주어진 형식의 분류 삼중항이 채워진 빈 레코드를 생성합니다.
    pub fn new(format: LogFormat, timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            hostname: String::new(),
            program: String::new(),
            pid: String::new(),
            message: String::new(),
            category: format.category().to_owned(),
            product: format.product().to_owned(),
            service: format.service().to_owned(),
            fields: BTreeMap::new(),
            matched_rules: Vec::new(),
        }
    }

    /// 연속 라인을 메시지 뒤에 공백으로 이어붙입니다.
    pub fn append_continuation(&mut self, line: &str) {
        self.message.push(' ');
        self.message.push_str(line);
    }

    /// 하나 이상의 규칙에 매칭되었는지 여부
    pub fn is_matched(&self) -> bool {
        !self.matched_rules.is_empty()
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: {}",
            self.timestamp, self.hostname, self.program, self.message,
        )
    }
}

/// 심각도 레벨
///
/// 탐지 규칙의 `level`을 나타냅니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Info < Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Severity {
    /// 정보성 이벤트
    #[default]
    Info,
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Medium,
    /// 높은 심각도
    High,
    /// 치명적: 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "info" | "informational" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "Info"),
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_str_is_case_insensitive() {
        assert_eq!("syslog".parse::<LogFormat>().unwrap(), LogFormat::Syslog);
        assert_eq!("JournalD".parse::<LogFormat>().unwrap(), LogFormat::Journald);
        assert_eq!(" auditd ".parse::<LogFormat>().unwrap(), LogFormat::Auditd);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "windows".parse::<LogFormat>().unwrap_err();
        assert!(err.to_string().contains("windows"));
    }

    #[test]
    fn classification_triples() {
        assert_eq!(LogFormat::Syslog.category(), "process");
        assert_eq!(LogFormat::Journald.category(), "process");
        assert_eq!(LogFormat::Auditd.category(), "audit");
        for format in LogFormat::ALL {
            assert_eq!(format.product(), "linux");
            assert_eq!(format.service(), format.as_str());
        }
    }

    #[test]
    fn new_record_has_full_triple() {
        let record = LogRecord::new(LogFormat::Auditd, "2024-01-15T12:00:00.000");
        assert_eq!(record.category, "audit");
        assert_eq!(record.product, "linux");
        assert_eq!(record.service, "auditd");
        assert!(record.matched_rules.is_empty());
        assert!(!record.is_matched());
    }

    #[test]
    fn continuation_is_space_joined() {
        let mut record = LogRecord::new(LogFormat::Syslog, "2024-01-15T12:00:00.000");
        record.message = "first".to_owned();
        record.append_continuation("second");
        assert_eq!(record.message, "first second");
    }

    #[test]
    fn record_serializes_with_fields() {
        let mut record = LogRecord::new(LogFormat::Auditd, "2024-01-15T12:00:00.000");
        record.fields.insert("syscall".to_owned(), "open".to_owned());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["service"], "auditd");
        assert_eq!(json["fields"]["syscall"], "open");
    }

    #[test]
    fn severity_from_str_loose() {
        assert_eq!(Severity::from_str_loose("informational"), Some(Severity::Info));
        assert_eq!(Severity::from_str_loose("HIGH"), Some(Severity::High));
        assert_eq!(Severity::from_str_loose("crit"), Some(Severity::Critical));
        assert_eq!(Severity::from_str_loose("urgent"), None);
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Low);
        assert!(Severity::High < Severity::Critical);
    }
}
