//! 필드 해석과 문자열 매칭
//!
//! 규칙의 매칭 조건은 로딩 시점에 [`Criteria`]로 한 번만 디코딩됩니다.
//! 정규식도 이때 컴파일되므로 매칭 시점에는 YAML 값을 다시 해석하지 않습니다.
//!
//! # 조건 형식
//! ```yaml
//! selection:
//!   message: "failed"                  # 접두어 없음: 대소문자 무시 부분 문자열
//!   program: "|startswith|sshd"        # 접두어 수정자
//!   pid: [1, 2, "3"]                   # 목록: 하나라도 매칭되면 참 (숫자는 문자열로 변환)
//!   exe: { endswith: "/bash" }         # 수정자 매핑: 첫 번째 유효한 수정자만 평가
//! ```

use regex::Regex;
use serde_yaml::Value;

use logsieve_core::types::LogRecord;

/// 레코드에서 필드 값을 해석합니다.
///
/// `message`, `hostname`, `program`, `pid`, `timestamp`는 레코드 속성에 대응하고,
/// 그 외 이름은 `fields`에서 찾습니다. 없으면 빈 문자열입니다.
pub fn resolve_field<'a>(record: &'a LogRecord, name: &str) -> &'a str {
    match name {
        "message" => &record.message,
        "hostname" => &record.hostname,
        "program" => &record.program,
        "pid" => &record.pid,
        "timestamp" => &record.timestamp,
        _ => record.fields.get(name).map_or("", String::as_str),
    }
}

/// 문자열 매칭 수정자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// 부분 문자열 포함
    Contains,
    /// 접두사 일치
    StartsWith,
    /// 접미사 일치
    EndsWith,
    /// 정규식 (대소문자 구분)
    Re,
}

impl Modifier {
    /// 수정자 매핑의 키 이름으로 수정자를 찾습니다.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "contains" => Some(Self::Contains),
            "startswith" => Some(Self::StartsWith),
            "endswith" => Some(Self::EndsWith),
            "re" => Some(Self::Re),
            _ => None,
        }
    }

    /// 문자열 조건에 포함되는 접두어 토큰
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Contains => "|contains|",
            Self::StartsWith => "|startswith|",
            Self::EndsWith => "|endswith|",
            Self::Re => "|re|",
        }
    }
}

/// 접두어 검사 순서
const PREFIX_ORDER: [Modifier; 4] = [
    Modifier::Re,
    Modifier::Contains,
    Modifier::StartsWith,
    Modifier::EndsWith,
];

/// 컴파일된 단일 문자열 매처
///
/// 대소문자를 무시하는 매처는 비교 대상을 소문자로 저장합니다.
#[derive(Debug, Clone)]
pub enum StringMatch {
    /// 부분 문자열 포함 (소문자)
    Contains(String),
    /// 접두사 일치 (소문자)
    StartsWith(String),
    /// 접미사 일치 (소문자)
    EndsWith(String),
    /// 컴파일된 정규식
    Regex(Regex),
    /// 컴파일에 실패한 정규식 -- 항상 불일치
    InvalidRegex(String),
}

impl StringMatch {
    /// 수정자와 값으로 매처를 만듭니다.
    ///
    /// 정규식 컴파일 실패는 경고 로그를 남기고 [`StringMatch::InvalidRegex`]가 됩니다.
    pub fn compile(modifier: Modifier, value: &str, rule_id: &str) -> Self {
        match modifier {
            Modifier::Contains => Self::Contains(value.to_lowercase()),
            Modifier::StartsWith => Self::StartsWith(value.to_lowercase()),
            Modifier::EndsWith => Self::EndsWith(value.to_lowercase()),
            Modifier::Re => match Regex::new(value) {
                Ok(regex) => Self::Regex(regex),
                Err(e) => {
                    tracing::warn!(
                        rule_id,
                        pattern = value,
                        error = %e,
                        "invalid regex in rule, criterion will never match"
                    );
                    Self::InvalidRegex(value.to_owned())
                }
            },
        }
    }

    /// 접두어 토큰이 포함될 수 있는 문자열 조건을 컴파일합니다.
    ///
    /// 접두어가 없으면 대소문자 무시 부분 문자열 매칭입니다.
    pub fn parse(pattern: &str, rule_id: &str) -> Self {
        for modifier in PREFIX_ORDER {
            if let Some(rest) = pattern.strip_prefix(modifier.prefix()) {
                return Self::compile(modifier, rest, rule_id);
            }
        }
        Self::compile(Modifier::Contains, pattern, rule_id)
    }

    /// 필드 값에 대해 매칭합니다.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Contains(needle) => value.to_lowercase().contains(needle.as_str()),
            Self::StartsWith(prefix) => value.to_lowercase().starts_with(prefix.as_str()),
            Self::EndsWith(suffix) => value.to_lowercase().ends_with(suffix.as_str()),
            Self::Regex(regex) => regex.is_match(value),
            Self::InvalidRegex(_) => false,
        }
    }
}

/// 한 필드에 대한 매칭 조건
#[derive(Debug, Clone)]
pub enum Criteria {
    /// 단일 문자열 조건
    Single(StringMatch),
    /// 대안 목록 -- 하나라도 매칭되면 참
    AnyOf(Vec<StringMatch>),
    /// 해석할 수 없는 조건 -- 항상 불일치
    Never,
}

impl Criteria {
    /// YAML 값을 매칭 조건으로 디코딩합니다.
    ///
    /// - 스칼라(문자열, 숫자, 불리언): 접두어 규칙을 따르는 단일 조건
    /// - 시퀀스: 스칼라 항목들의 OR, null이나 중첩 항목은 무시
    /// - 매핑: 문서 순서상 첫 번째로 유효한 `수정자: 스칼라` 항목
    /// - 그 외: [`Criteria::Never`]
    pub fn from_yaml(value: &Value, rule_id: &str, field: &str) -> Self {
        match value {
            Value::Sequence(items) => Self::AnyOf(
                items
                    .iter()
                    .filter_map(scalar_to_string)
                    .map(|s| StringMatch::parse(&s, rule_id))
                    .collect(),
            ),
            Value::Mapping(map) => {
                let modifier_keys = map
                    .keys()
                    .filter(|k| k.as_str().and_then(Modifier::from_key).is_some())
                    .count();
                if modifier_keys > 1 {
                    tracing::warn!(
                        rule_id,
                        field,
                        modifiers = modifier_keys,
                        "multiple modifiers for one field, only the first valid one is evaluated"
                    );
                }

                map.iter()
                    .find_map(|(key, value)| {
                        let modifier = key.as_str().and_then(Modifier::from_key)?;
                        let value = scalar_to_string(value)?;
                        Some(StringMatch::compile(modifier, &value, rule_id))
                    })
                    .map_or(Self::Never, Self::Single)
            }
            other => match scalar_to_string(other) {
                Some(s) => Self::Single(StringMatch::parse(&s, rule_id)),
                None => Self::Never,
            },
        }
    }

    /// 필드 값에 대해 매칭합니다.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Single(m) => m.matches(value),
            Self::AnyOf(alternatives) => alternatives.iter().any(|m| m.matches(value)),
            Self::Never => false,
        }
    }
}

/// 스칼라 YAML 값을 문자열로 변환합니다. null과 중첩 값은 `None`입니다.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 필드 하나와 그 조건
#[derive(Debug, Clone)]
pub struct FieldCriterion {
    /// 필드명
    pub field: String,
    /// 매칭 조건
    pub criteria: Criteria,
}

impl FieldCriterion {
    /// 레코드에 대해 평가합니다.
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.criteria.matches(resolve_field(record, &self.field))
    }
}

/// 이름 있는 selection 블록 -- 블록 안의 모든 필드 조건은 AND로 결합됩니다.
#[derive(Debug, Clone)]
pub struct SelectionBlock {
    /// 블록 이름 (소문자)
    pub name: String,
    /// 필드 조건 목록
    pub criteria: Vec<FieldCriterion>,
}

impl SelectionBlock {
    /// 블록의 모든 필드 조건이 레코드에 매칭되는지 평가합니다.
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.criteria.iter().all(|c| c.matches(record))
    }
}
