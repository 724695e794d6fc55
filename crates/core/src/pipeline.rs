//! 파이프라인 trait: 모듈 확장 포인트 정의

use crate::types::{LogFormat, LogRecord};

/// 한 줄 단위 로그 파서 trait
///
/// 새로운 로그 형식을 지원하려면 이 trait을 구현합니다.
/// 형식에 맞지 않는 라인은 `None`을 반환하며, 연속 라인 처리는 호출자가 담당합니다.
pub trait LineParser: Send + Sync {
    /// 파서가 처리하는 로그 형식
    fn format(&self) -> LogFormat;

    /// 한 줄을 정규화된 레코드로 파싱
    fn parse_line(&self, line: &str) -> Option<LogRecord>;
}

/// 탐지 로직을 구현하는 trait
///
/// 레코드 하나를 평가하여 매칭된 규칙 ID 목록을 반환합니다.
pub trait Detector: Send + Sync {
    /// 탐지기 이름
    fn name(&self) -> &str;

    /// 레코드에 매칭되는 규칙 ID 목록 (순서 무관, 비어 있을 수 있음)
    fn detect(&self, record: &LogRecord) -> Vec<String>;
}
