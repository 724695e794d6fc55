//! 설정 관리: logsieve.toml 파싱 및 런타임 설정
//!
//! [`LogsieveConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`LOGSIEVE_ANALYSIS_FORMAT=auditd` 형식)
//! 2. 설정 파일 (`logsieve.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logsieve_core::error::LogsieveError> {
//! use logsieve_core::config::LogsieveConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogsieveConfig::load("logsieve.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogsieveConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogsieveError};
use crate::types::LogFormat;

/// logsieve 통합 설정
///
/// `logsieve.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogsieveConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 규칙 로딩 설정
    #[serde(default)]
    pub rules: RulesConfig,
    /// 로그 분석 설정
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl LogsieveConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogsieveError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogsieveError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogsieveError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogsieveError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogsieveError> {
        toml::from_str(toml_str).map_err(|e| {
            LogsieveError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGSIEVE_{SECTION}_{FIELD}`
    /// 예: `LOGSIEVE_RULES_DIRS=/etc/logsieve/rules,/opt/rules`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGSIEVE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGSIEVE_GENERAL_LOG_FORMAT");

        // Rules
        override_csv(&mut self.rules.dirs, "LOGSIEVE_RULES_DIRS");
        override_bool(
            &mut self.rules.include_standard_layout,
            "LOGSIEVE_RULES_INCLUDE_STANDARD_LAYOUT",
        );

        // Analysis
        override_string(&mut self.analysis.format, "LOGSIEVE_ANALYSIS_FORMAT");
        override_bool(
            &mut self.analysis.matched_only,
            "LOGSIEVE_ANALYSIS_MATCHED_ONLY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogsieveError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.rules.dirs.iter().any(|dir| dir.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "rules.dirs".to_owned(),
                reason: "rule directory must not be empty".to_owned(),
            }
            .into());
        }

        self.analysis.log_format()?;

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 규칙 로딩 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// 규칙 파일을 재귀적으로 탐색할 디렉토리 목록
    pub dirs: Vec<String>,
    /// 각 디렉토리 아래의 표준 하위 구조(linux/*, external/*)도 명시적으로 포함할지 여부
    pub include_standard_layout: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            dirs: vec!["./rules".to_owned()],
            include_standard_layout: false,
        }
    }
}

/// 로그 분석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 로그 형식 (syslog, journald, auditd)
    pub format: String,
    /// 매칭된 레코드만 결과에 남길지 여부
    pub matched_only: bool,
}

impl AnalysisConfig {
    /// 설정된 로그 형식을 파싱합니다.
    pub fn log_format(&self) -> Result<LogFormat, LogsieveError> {
        self.format.parse::<LogFormat>().map_err(|e| {
            ConfigError::InvalidValue {
                field: "analysis.format".to_owned(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Syslog.as_str().to_owned(),
            matched_only: true,
        }
    }
}

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
