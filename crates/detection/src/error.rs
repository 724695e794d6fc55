//! 탐지 엔진 에러 타입
//!
//! [`EngineError`]는 로그 정규화, 규칙 로딩, 분석 과정에서 발생하는 모든 에러를 표현합니다.
//! `From<EngineError> for LogsieveError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.
//!
//! 에러의 영향 범위는 항상 그 에러를 만든 작업 단위(파일 하나, 규칙 하나)로 한정됩니다.

use logsieve_core::error::{ConfigError, DetectionError, LogsieveError, ParseError};

/// 탐지 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 로그 파일을 열거나 읽을 수 없음 (해당 파일에만 치명적)
    #[error("file access error: {path}: {reason}")]
    FileAccess {
        /// 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 지원하지 않는 로그 형식
    #[error("unsupported log format: {0}")]
    UnsupportedFormat(String),

    /// 규칙 파일 로딩 실패 (파일 읽기, YAML 파싱)
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 규칙 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 규칙 유효성 검증 실패
    #[error("rule validation error: rule '{rule_id}': {reason}")]
    RuleValidation {
        /// 문제가 된 규칙 ID
        rule_id: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EngineError> for LogsieveError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::FileAccess { .. } => {
                LogsieveError::Detection(DetectionError::FileAccess(err.to_string()))
            }
            EngineError::UnsupportedFormat(format) => {
                LogsieveError::Parse(ParseError::UnsupportedFormat(format))
            }
            EngineError::RuleLoad { .. } | EngineError::RuleValidation { .. } => {
                LogsieveError::Detection(DetectionError::Rule(err.to_string()))
            }
            EngineError::Config { field, reason } => {
                LogsieveError::Config(ConfigError::InvalidValue { field, reason })
            }
            EngineError::Io(e) => LogsieveError::Io(e),
        }
    }
}

impl From<ParseError> for EngineError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnsupportedFormat(format) => EngineError::UnsupportedFormat(format),
        }
    }
}
