//! 로깅 초기화
//!
//! `[general]` 설정에 따라 `tracing-subscriber`를 구성합니다.
//! JSON 구조화 로그와 사람이 읽기 쉬운 pretty 형식을 지원합니다.
//! `RUST_LOG` 환경변수가 있으면 `log_level`보다 우선합니다.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::GeneralConfig;
use crate::error::{ConfigError, LogsieveError};

/// 전역 tracing subscriber를 초기화합니다.
///
/// 프로세스당 한 번만 호출해야 합니다. 이미 설치된 경우 에러를 반환합니다.
///
/// # Formats
///
/// * `"json"` - JSON lines (수집 파이프라인 연동용)
/// * `"pretty"` - 컬러 출력 (개발/대화형 사용)
pub fn init_tracing(config: &GeneralConfig) -> Result<(), LogsieveError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| {
                ConfigError::Logging(format!("failed to initialize JSON tracing subscriber: {e}"))
            })?,
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .map_err(|e| {
                ConfigError::Logging(format!(
                    "failed to initialize pretty tracing subscriber: {e}"
                ))
            })?,
        other => {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("unknown log format '{other}', expected 'json' or 'pretty'"),
            }
            .into());
        }
    }

    Ok(())
}
