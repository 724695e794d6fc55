//! 탐지 규칙 데이터 타입
//!
//! YAML 규칙 파일은 먼저 느슨한 [`RawRule`]로 역직렬화된 뒤,
//! [`DetectionRule::from_raw`]에서 검증과 함께 컴파일된 형태로 변환됩니다.

use std::collections::HashSet;
use std::fmt;

use logsieve_core::types::{LogRecord, Severity};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

use super::condition::Condition;
use super::matcher::{Criteria, FieldCriterion, SelectionBlock};
use crate::error::EngineError;

/// 규칙 ID 최대 길이
const MAX_RULE_ID_LEN: usize = 256;

/// detection 본문에서 조건식을 담는 예약 키
const CONDITION_KEY: &str = "condition";

/// 규칙 상태 (Sigma `status`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleStatus {
    /// 안정
    Stable,
    /// 테스트 중
    Test,
    /// 실험적
    Experimental,
    /// 폐기 예정
    Deprecated,
    /// 지원하지 않음
    Unsupported,
    /// 알 수 없는 상태 값 (원문 유지)
    Other(String),
}

impl RuleStatus {
    /// 문자열에서 상태를 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "stable" => Self::Stable,
            "test" | "testing" => Self::Test,
            "experimental" => Self::Experimental,
            "deprecated" => Self::Deprecated,
            "unsupported" => Self::Unsupported,
            _ => Self::Other(s.trim().to_owned()),
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Test => write!(f, "test"),
            Self::Experimental => write!(f, "experimental"),
            Self::Deprecated => write!(f, "deprecated"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// 로그 소스 필터
///
/// 비어 있지 않은 속성은 레코드의 해당 속성과 정확히 일치해야 합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSourceFilter {
    /// 분류 (`process`, `audit` 등)
    #[serde(default)]
    pub category: Option<String>,
    /// 제품 (`linux`)
    #[serde(default)]
    pub product: Option<String>,
    /// 서비스 (`syslog`, `journald`, `auditd`)
    #[serde(default)]
    pub service: Option<String>,
}

impl LogSourceFilter {
    /// 레코드가 필터 조건을 만족하는지 검사합니다.
    pub fn matches(&self, record: &LogRecord) -> bool {
        attribute_matches(self.category.as_deref(), &record.category)
            && attribute_matches(self.product.as_deref(), &record.product)
            && attribute_matches(self.service.as_deref(), &record.service)
    }
}

fn attribute_matches(filter: Option<&str>, actual: &str) -> bool {
    match filter {
        None | Some("") => true,
        Some(expected) => expected == actual,
    }
}

/// 컴파일된 detection 본문
#[derive(Debug, Clone)]
pub struct Detection {
    /// 선언 순서대로의 selection 블록
    pub blocks: Vec<SelectionBlock>,
    /// 조건식
    pub condition: Condition,
}

impl Detection {
    /// 레코드에 대해 조건식을 평가합니다.
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.condition.evaluate(&self.blocks, record)
    }
}

/// YAML에서 역직렬화된 검증 전 규칙
///
/// # YAML 스키마
/// ```yaml
/// id: ssh_failed_password
/// title: SSH Failed Password
/// status: stable
/// level: medium
/// logsource:
///   product: linux
///   service: syslog
/// detection:
///   selection:
///     program: "|startswith|sshd"
///     message: "Failed password"
///   condition: selection
/// tags:
///   - attack.credential_access
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRule {
    /// 규칙 ID
    #[serde(default)]
    pub id: String,
    /// 규칙 제목
    #[serde(default)]
    pub title: String,
    /// 상태
    pub status: Option<String>,
    /// 설명
    pub description: Option<String>,
    /// 작성자
    pub author: Option<String>,
    /// 작성일
    pub date: Option<String>,
    /// 수정일
    pub modified: Option<String>,
    /// 분류 태그
    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,
    /// 심각도
    pub level: Option<String>,
    /// 로그 소스 필터
    #[serde(default)]
    pub logsource: LogSourceFilter,
    /// detection 본문
    pub detection: Option<Mapping>,
    /// 오탐 가능성 메모
    #[serde(default, deserialize_with = "one_or_many")]
    pub falsepositives: Vec<String>,
    /// 출력 권장 필드
    #[serde(default, deserialize_with = "one_or_many")]
    pub fields: Vec<String>,
}

/// 문자열 하나 또는 문자열 목록을 받아들입니다.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// 검증과 컴파일을 마친 탐지 규칙 -- 로딩 후에는 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct DetectionRule {
    /// 규칙 고유 ID
    pub id: String,
    /// 규칙 제목
    pub title: String,
    /// 상태
    pub status: Option<RuleStatus>,
    /// 설명
    pub description: Option<String>,
    /// 작성자
    pub author: Option<String>,
    /// 작성일
    pub date: Option<String>,
    /// 수정일
    pub modified: Option<String>,
    /// 분류 태그
    pub tags: Vec<String>,
    /// 심각도
    pub level: Option<Severity>,
    /// 로그 소스 필터
    pub logsource: LogSourceFilter,
    /// 컴파일된 detection 본문
    pub detection: Detection,
    /// 오탐 가능성 메모
    pub falsepositives: Vec<String>,
    /// 출력 권장 필드
    pub fields: Vec<String>,
    /// 규칙을 읽어 온 위치 (파일 경로 등)
    pub source: String,
}

impl DetectionRule {
    /// 검증 전 규칙을 검증하고 컴파일합니다.
    ///
    /// # Errors
    /// - `id`, `title`, `detection`이 없거나 비어 있는 경우
    /// - `condition`이 없거나 문자열 하나가 아닌 경우
    /// - selection 블록이 없거나, 비어 있지 않은 매핑이 아닌 블록이 있는 경우
    pub fn from_raw(raw: RawRule, source: &str) -> Result<Self, EngineError> {
        let id = raw.id.trim().to_owned();
        if id.is_empty() {
            return Err(EngineError::RuleLoad {
                path: source.to_owned(),
                reason: "missing required field 'id'".to_owned(),
            });
        }
        if id.len() > MAX_RULE_ID_LEN {
            return Err(EngineError::RuleValidation {
                rule_id: id,
                reason: format!("rule id must not exceed {MAX_RULE_ID_LEN} characters"),
            });
        }
        if raw.title.trim().is_empty() {
            return Err(EngineError::RuleValidation {
                rule_id: id,
                reason: "missing required field 'title'".to_owned(),
            });
        }
        let Some(body) = raw.detection else {
            return Err(EngineError::RuleValidation {
                rule_id: id,
                reason: "missing required field 'detection'".to_owned(),
            });
        };

        let detection = compile_detection(&id, &body)?;

        let level = raw.level.as_deref().and_then(|level| {
            let parsed = Severity::from_str_loose(level);
            if parsed.is_none() {
                tracing::warn!(rule_id = %id, level, "unknown rule level, ignoring");
            }
            parsed
        });

        Ok(Self {
            title: raw.title,
            status: raw.status.as_deref().map(RuleStatus::from_str_loose),
            description: raw.description,
            author: raw.author,
            date: raw.date,
            modified: raw.modified,
            tags: raw.tags,
            level,
            logsource: raw.logsource,
            detection,
            falsepositives: raw.falsepositives,
            fields: raw.fields,
            source: source.to_owned(),
            id,
        })
    }

    /// 로그 소스 필터와 조건식을 모두 만족하면 참입니다.
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.logsource.matches(record) && self.detection.matches(record)
    }
}

fn compile_detection(rule_id: &str, body: &Mapping) -> Result<Detection, EngineError> {
    let invalid = |reason: String| EngineError::RuleValidation {
        rule_id: rule_id.to_owned(),
        reason,
    };

    let condition = match body.get(CONDITION_KEY) {
        Some(Value::String(expr)) => Condition::parse(expr),
        Some(Value::Sequence(_)) => {
            return Err(invalid("exactly one condition expression is supported".to_owned()));
        }
        Some(_) => return Err(invalid("condition must be a string".to_owned())),
        None => return Err(invalid("detection is missing 'condition'".to_owned())),
    };

    let mut blocks = Vec::new();
    let mut names = HashSet::new();

    for (key, value) in body {
        let Some(raw_name) = key.as_str() else {
            return Err(invalid(format!("selection block name must be a string: {key:?}")));
        };
        if raw_name == CONDITION_KEY {
            continue;
        }

        let name = raw_name.to_lowercase();
        if !names.insert(name.clone()) {
            return Err(invalid(format!("duplicate selection block '{raw_name}'")));
        }

        let Value::Mapping(fields) = value else {
            return Err(invalid(format!("selection block '{raw_name}' must be a mapping")));
        };
        if fields.is_empty() {
            return Err(invalid(format!("selection block '{raw_name}' is empty")));
        }

        let mut criteria = Vec::with_capacity(fields.len());
        for (field, value) in fields {
            let Some(field) = field.as_str() else {
                return Err(invalid(format!(
                    "field name in block '{raw_name}' must be a string: {field:?}"
                )));
            };
            criteria.push(FieldCriterion {
                field: field.to_owned(),
                criteria: Criteria::from_yaml(value, rule_id, field),
            });
        }

        blocks.push(SelectionBlock { name, criteria });
    }

    if blocks.is_empty() {
        return Err(invalid("detection has no selection block".to_owned()));
    }

    for name in condition.referenced_blocks() {
        if !names.contains(name) {
            tracing::warn!(
                rule_id,
                block = name,
                "condition references an unknown selection block, it always evaluates to false"
            );
        }
    }

    Ok(Detection { blocks, condition })
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsieve_core::types::LogFormat;

    fn raw(yaml: &str) -> RawRule {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn compile(yaml: &str) -> Result<DetectionRule, EngineError> {
        DetectionRule::from_raw(raw(yaml), "test.yml")
    }

    fn record(format: LogFormat, message: &str) -> LogRecord {
        let mut record = LogRecord::new(format, "2025-01-01T00:00:00.000");
        record.message = message.to_owned();
        record
    }

    const VALID: &str = r#"
id: ssh_failed
title: SSH failed password
status: Stable
level: high
author: ops
date: 2024/01/01
tags: [attack.t1110, brute_force]
falsepositives: Admin typos
logsource:
  product: linux
  service: syslog
detection:
  selection:
    message: "Failed password"
  condition: selection
"#;

    #[test]
    fn valid_rule_compiles_with_metadata() {
        let rule = compile(VALID).unwrap();
        assert_eq!(rule.id, "ssh_failed");
        assert_eq!(rule.status, Some(RuleStatus::Stable));
        assert_eq!(rule.level, Some(Severity::High));
        assert_eq!(rule.date.as_deref(), Some("2024/01/01"));
        assert_eq!(rule.tags.len(), 2);
        assert_eq!(rule.falsepositives, vec!["Admin typos".to_owned()]);
        assert_eq!(rule.logsource.service.as_deref(), Some("syslog"));
        assert_eq!(rule.detection.blocks.len(), 1);
        assert_eq!(rule.detection.condition, Condition::AllBlocks);
        assert_eq!(rule.source, "test.yml");
    }

    #[test]
    fn rule_matches_respects_logsource() {
        let rule = compile(VALID).unwrap();
        assert!(rule.matches(&record(LogFormat::Syslog, "Failed password for root")));
        assert!(!rule.matches(&record(LogFormat::Journald, "Failed password for root")));
        assert!(!rule.matches(&record(LogFormat::Syslog, "Accepted password")));
    }

    #[test]
    fn missing_id_is_rejected() {
        let err = compile("title: t\ndetection:\n  selection:\n    message: x\n  condition: selection\n")
            .unwrap_err();
        assert!(matches!(err, EngineError::RuleLoad { .. }));
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn missing_title_is_rejected() {
        let err = compile("id: r1\ndetection:\n  selection:\n    message: x\n  condition: selection\n")
            .unwrap_err();
        assert!(err.to_string().contains("'title'"));
    }

    #[test]
    fn missing_detection_is_rejected() {
        let err = compile("id: r1\ntitle: t\n").unwrap_err();
        assert!(err.to_string().contains("'detection'"));
    }

    #[test]
    fn missing_condition_is_rejected() {
        let err = compile("id: r1\ntitle: t\ndetection:\n  selection:\n    message: x\n").unwrap_err();
        assert!(err.to_string().contains("condition"));
    }

    #[test]
    fn condition_list_is_rejected() {
        let err = compile(
            "id: r1\ntitle: t\ndetection:\n  selection:\n    message: x\n  condition:\n    - selection\n    - selection\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("exactly one"));
    }

    #[test]
    fn no_selection_block_is_rejected() {
        let err = compile("id: r1\ntitle: t\ndetection:\n  condition: selection\n").unwrap_err();
        assert!(err.to_string().contains("no selection block"));
    }

    #[test]
    fn non_mapping_block_is_rejected() {
        let err = compile(
            "id: r1\ntitle: t\ndetection:\n  keywords:\n    - panic\n  condition: keywords\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("must be a mapping"));
    }

    #[test]
    fn empty_block_is_rejected() {
        let err = compile("id: r1\ntitle: t\ndetection:\n  selection: {}\n  condition: selection\n")
            .unwrap_err();
        assert!(err.to_string().contains("is empty"));
    }

    #[test]
    fn too_long_id_is_rejected() {
        let yaml = format!(
            "id: {}\ntitle: t\ndetection:\n  selection:\n    message: x\n  condition: selection\n",
            "a".repeat(MAX_RULE_ID_LEN + 1)
        );
        assert!(compile(&yaml).is_err());
    }

    #[test]
    fn block_names_are_case_insensitive() {
        let rule = compile(
            "id: r1\ntitle: t\ndetection:\n  Sel_A:\n    message: alpha\n  condition: SEL_A\n",
        )
        .unwrap();
        assert!(rule.matches(&record(LogFormat::Syslog, "alpha")));
    }

    #[test]
    fn unknown_level_and_status_are_tolerated() {
        let rule = compile(
            "id: r1\ntitle: t\nstatus: beta\nlevel: extreme\ndetection:\n  selection:\n    message: x\n  condition: selection\n",
        )
        .unwrap();
        assert_eq!(rule.status, Some(RuleStatus::Other("beta".to_owned())));
        assert_eq!(rule.level, None);
    }

    #[test]
    fn empty_logsource_attributes_match_anything() {
        let filter = LogSourceFilter {
            category: Some(String::new()),
            product: None,
            service: Some("auditd".to_owned()),
        };
        assert!(filter.matches(&record(LogFormat::Auditd, "")));
        assert!(!filter.matches(&record(LogFormat::Syslog, "")));
        assert!(LogSourceFilter::default().matches(&record(LogFormat::Journald, "")));
    }

    #[test]
    fn logsource_is_case_sensitive() {
        let filter = LogSourceFilter {
            service: Some("Syslog".to_owned()),
            ..Default::default()
        };
        assert!(!filter.matches(&record(LogFormat::Syslog, "")));
    }

    #[test]
    fn status_display() {
        assert_eq!(RuleStatus::from_str_loose(" Experimental ").to_string(), "experimental");
        assert_eq!(RuleStatus::from_str_loose("custom").to_string(), "custom");
    }
}
