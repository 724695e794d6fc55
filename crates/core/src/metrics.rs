//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 익스포터 설치는 임베딩하는 애플리케이션의 몫입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logsieve_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 로그 형식 레이블 키 (syslog, journald, auditd)
pub const LABEL_FORMAT: &str = "format";

/// 규칙 ID 레이블 키
pub const LABEL_RULE_ID: &str = "rule_id";

// ─── Normalizer 메트릭 ──────────────────────────────────────────────

/// 정규화된 레코드 수 (counter, label: format)
pub const RECORDS_NORMALIZED_TOTAL: &str = "logsieve_records_normalized_total";

/// 이전 레코드에 이어붙여진 연속 라인 수 (counter, label: format)
pub const LINES_CONTINUED_TOTAL: &str = "logsieve_lines_continued_total";

/// 이전 레코드가 없어 버려진 라인 수 (counter, label: format)
pub const LINES_DROPPED_TOTAL: &str = "logsieve_lines_dropped_total";

// ─── Rule 메트릭 ────────────────────────────────────────────────────

/// 로드된 규칙 수 (gauge)
pub const RULES_LOADED: &str = "logsieve_rules_loaded";

/// 파싱/검증 실패로 건너뛴 규칙 파일 수 (counter)
pub const RULES_SKIPPED_TOTAL: &str = "logsieve_rules_skipped_total";

/// 규칙 매칭 수 (counter, label: rule_id)
pub const RULE_MATCHES_TOTAL: &str = "logsieve_rule_matches_total";

/// 모든 메트릭의 설명을 등록합니다.
///
/// 레코더 설치 후 한 번 호출합니다. 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        RECORDS_NORMALIZED_TOTAL,
        "Total log records produced by the normalizer"
    );
    describe_counter!(
        LINES_CONTINUED_TOTAL,
        "Lines appended to the previous record as continuation"
    );
    describe_counter!(
        LINES_DROPPED_TOTAL,
        "Unparseable lines dropped because no previous record existed"
    );
    describe_gauge!(RULES_LOADED, "Detection rules currently loaded");
    describe_counter!(
        RULES_SKIPPED_TOTAL,
        "Rule files skipped due to parse or validation failure"
    );
    describe_counter!(RULE_MATCHES_TOTAL, "Total rule matches");
}
