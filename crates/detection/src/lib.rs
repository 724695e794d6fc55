#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`parser`]: syslog, journald, auditd 라인 파서 및 정규화기
//! - [`rule`]: YAML 기반 탐지 규칙 (간소화된 Sigma 스타일)
//! - [`engine`]: 규칙 모음 평가 및 레코드 주석
//! - [`pipeline`]: 파일 단위 분석 오케스트레이션
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! bytes -> LogNormalizer -> LogRecord -> DetectionEngine -> LogRecord + matched rule ids
//!              |                              |
//!   syslog/journald/auditd        RuleSet (loader, matcher, condition)
//! ```

pub mod engine;
pub mod error;
pub mod pipeline;

pub mod parser;
pub mod rule;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::DetectionEngine;

// 파일 분석
pub use pipeline::{Analyzer, FileReport};

// 에러
pub use error::EngineError;

// 정규화
pub use parser::{AuditdParser, JournaldParser, LogNormalizer, SyslogParser};

// 규칙
pub use rule::{DetectionRule, RuleLoader, RuleSet};
