//! 탐지 엔진 -- 레코드 하나를 전체 규칙 모음에 대해 평가합니다.
//!
//! 규칙 모음은 `Arc`로 공유되는 읽기 전용 값이므로 엔진은 복제 비용이 작고
//! 여러 태스크에서 동시에 사용할 수 있습니다. 규칙 하나의 평가는 다른 규칙의 평가와
//! 상태를 공유하지 않습니다.

use std::sync::Arc;

use logsieve_core::metrics as m;
use logsieve_core::pipeline::Detector;
use logsieve_core::types::LogRecord;

use crate::rule::RuleSet;

/// 탐지 엔진
///
/// # 사용 예시
/// ```ignore
/// let rules = RuleLoader::load_directories(&["./rules"]).await;
/// let engine = DetectionEngine::new(rules);
///
/// let record = engine.annotate(record);
/// if record.is_matched() {
///     println!("{}: {:?}", record, record.matched_rules);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DetectionEngine {
    rules: Arc<RuleSet>,
}

impl DetectionEngine {
    /// 규칙 모음으로 엔진을 생성합니다.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// 이미 공유 중인 규칙 모음으로 엔진을 생성합니다.
    pub fn from_shared(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// 엔진이 사용하는 규칙 모음
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// 로드된 규칙 수
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// 레코드에 매칭되는 규칙 ID 목록을 반환합니다 (규칙 로딩 순서).
    pub fn evaluate(&self, record: &LogRecord) -> Vec<String> {
        let mut matched = Vec::new();
        for rule in self.rules.iter() {
            if rule.matches(record) {
                metrics::counter!(m::RULE_MATCHES_TOTAL, m::LABEL_RULE_ID => rule.id.clone())
                    .increment(1);
                tracing::trace!(rule_id = %rule.id, record = %record, "rule matched");
                matched.push(rule.id.clone());
            }
        }
        matched
    }

    /// 레코드를 평가하여 매칭된 규칙 ID를 기록한 뒤 돌려줍니다.
    ///
    /// 레코드에 가하는 변경은 `matched_rules` 설정뿐입니다.
    pub fn annotate(&self, mut record: LogRecord) -> LogRecord {
        record.matched_rules = self.evaluate(&record);
        record
    }

    /// 레코드 목록 전체를 순서대로 평가합니다.
    pub fn annotate_all(&self, records: Vec<LogRecord>) -> Vec<LogRecord> {
        records.into_iter().map(|r| self.annotate(r)).collect()
    }
}

impl Detector for DetectionEngine {
    fn name(&self) -> &str {
        "sigma-rules"
    }

    fn detect(&self, record: &LogRecord) -> Vec<String> {
        self.evaluate(record)
    }
}
