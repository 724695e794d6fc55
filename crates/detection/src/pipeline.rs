//! 파일 분석 -- 로그 파일 하나를 정규화하고 규칙을 평가하는 흐름을 관리합니다.
//!
//! [`Analyzer`]는 설정에서 규칙 모음을 한 번 로드한 뒤 여러 파일에 재사용합니다.
//! 파일 하나의 에러는 호출자에게 반환될 뿐 분석기의 상태에 영향을 주지 않습니다.
//!
//! # 내부 흐름
//! ```text
//! file bytes -> LogNormalizer -> Vec<LogRecord> -> DetectionEngine -> FileReport
//! ```

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use logsieve_core::config::{LogsieveConfig, RulesConfig};
use logsieve_core::types::{LogFormat, LogRecord};

use crate::engine::DetectionEngine;
use crate::error::EngineError;
use crate::parser::LogNormalizer;
use crate::rule::RuleLoader;

/// 파일 하나의 분석 결과
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// 분석한 파일 경로
    pub path: PathBuf,
    /// 사용한 로그 형식
    pub format: LogFormat,
    /// 결과 레코드 (`matched_only`이면 매칭된 레코드만)
    pub records: Vec<LogRecord>,
    /// 정규화된 전체 레코드 수
    pub total_records: usize,
    /// 규칙에 하나 이상 매칭된 레코드 수
    pub matched_records: usize,
    /// 처리 소요 시간
    pub elapsed: Duration,
}

/// 로그 파일 분석기
///
/// # 사용 예시
/// ```ignore
/// let config = LogsieveConfig::load("logsieve.toml").await?;
/// let analyzer = Analyzer::from_config(&config).await?;
///
/// let report = analyzer.analyze_file("/var/log/messages", analyzer.format()).await?;
/// println!("{} / {} matched", report.matched_records, report.total_records);
/// ```
#[derive(Debug, Clone)]
pub struct Analyzer {
    engine: DetectionEngine,
    format: LogFormat,
    matched_only: bool,
}

impl Analyzer {
    /// 엔진과 기본 형식으로 분석기를 생성합니다. 기본적으로 매칭된 레코드만 남깁니다.
    pub fn new(engine: DetectionEngine, format: LogFormat) -> Self {
        Self {
            engine,
            format,
            matched_only: true,
        }
    }

    /// 설정에 따라 규칙을 로드하여 분석기를 생성합니다.
    ///
    /// # Errors
    /// `analysis.format`이 지원하지 않는 형식이면 [`EngineError::UnsupportedFormat`]을 반환합니다.
    /// 규칙 로딩 실패는 에러가 아닙니다.
    pub async fn from_config(config: &LogsieveConfig) -> Result<Self, EngineError> {
        let format = config.analysis.format.parse::<LogFormat>()?;
        let dirs = rule_dirs(&config.rules);
        let rules = RuleLoader::load_directories(&dirs).await;

        if rules.is_empty() {
            tracing::warn!(dirs = ?dirs, "no detection rules loaded, nothing will match");
        }

        Ok(Self::new(DetectionEngine::new(rules), format)
            .with_matched_only(config.analysis.matched_only))
    }

    /// 매칭된 레코드만 남길지 설정합니다.
    pub fn with_matched_only(mut self, matched_only: bool) -> Self {
        self.matched_only = matched_only;
        self
    }

    /// 설정된 기본 로그 형식
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// 내부 탐지 엔진
    pub fn engine(&self) -> &DetectionEngine {
        &self.engine
    }

    /// 로그 파일 하나를 지정한 형식으로 분석합니다.
    ///
    /// # Errors
    /// 파일이 없거나 읽을 수 없으면 [`EngineError::FileAccess`]를 반환합니다.
    pub async fn analyze_file(
        &self,
        path: impl AsRef<Path>,
        format: LogFormat,
    ) -> Result<FileReport, EngineError> {
        let path = path.as_ref();
        let started = Instant::now();

        let records = LogNormalizer::new(format).normalize_file(path).await?;
        let total_records = records.len();

        let mut annotated = self.engine.annotate_all(records);
        let matched_records = annotated.iter().filter(|r| r.is_matched()).count();
        if self.matched_only {
            annotated.retain(LogRecord::is_matched);
        }

        let elapsed = started.elapsed();
        tracing::info!(
            path = %path.display(),
            format = %format,
            total_records,
            matched_records,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "log file analyzed"
        );

        Ok(FileReport {
            path: path.to_path_buf(),
            format,
            records: annotated,
            total_records,
            matched_records,
            elapsed,
        })
    }
}

/// 규칙 설정에서 탐색할 디렉토리 목록을 만듭니다.
pub fn rule_dirs(config: &RulesConfig) -> Vec<PathBuf> {
    if config.include_standard_layout {
        config
            .dirs
            .iter()
            .flat_map(RuleLoader::standard_layout)
            .collect()
    } else {
        config.dirs.iter().map(PathBuf::from).collect()
    }
}
