//! 탐지 규칙 -- Sigma 스타일 YAML 규칙의 로딩, 검증, 매칭
//!
//! # 규칙 형식
//! ```yaml
//! id: ssh_failed_password
//! title: SSH Failed Password
//! level: medium
//! logsource:
//!   service: syslog
//! detection:
//!   sel_auth:
//!     program: "|startswith|sshd"
//!   sel_fail:
//!     message: ["Failed password", "|re|Invalid user \\w+"]
//!   condition: sel_auth and sel_fail
//! ```
//!
//! # 아키텍처
//! - [`RuleSet`]: 로딩 후 변경되지 않는 규칙 모음
//! - [`loader`]: YAML 파일 탐색, 로딩, 유효성 검증
//! - [`matcher`]: 필드 해석과 문자열 매칭 (contains, startswith, endswith, re)
//! - [`condition`]: selection 블록 결과를 조합하는 조건식
//! - [`types`]: 규칙 데이터 구조 정의

pub mod condition;
pub mod loader;
pub mod matcher;
pub mod types;

pub use condition::Condition;
pub use loader::RuleLoader;
pub use matcher::{Criteria, FieldCriterion, Modifier, SelectionBlock, StringMatch, resolve_field};
pub use types::{Detection, DetectionRule, LogSourceFilter, RawRule, RuleStatus};

use std::collections::HashSet;

use crate::error::EngineError;

/// 탐지 규칙 모음
///
/// 생성 후에는 읽기 전용이며, 규칙 ID는 모음 안에서 유일합니다.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<DetectionRule>,
}

impl RuleSet {
    /// 규칙 목록으로 모음을 만듭니다.
    ///
    /// # Errors
    /// 같은 ID를 가진 규칙이 둘 이상이면 [`EngineError::RuleValidation`]을 반환합니다.
    pub fn new(rules: Vec<DetectionRule>) -> Result<Self, EngineError> {
        let mut seen = HashSet::with_capacity(rules.len());
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(EngineError::RuleValidation {
                    rule_id: rule.id.clone(),
                    reason: "duplicate rule id".to_owned(),
                });
            }
        }
        Ok(Self { rules })
    }

    /// 이미 ID 중복이 제거된 목록으로 모음을 만듭니다.
    pub(crate) fn from_unique(rules: Vec<DetectionRule>) -> Self {
        Self { rules }
    }

    /// 규칙 수
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 규칙이 하나도 없는지 여부
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 규칙을 로딩 순서대로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &DetectionRule> {
        self.rules.iter()
    }

    /// ID로 규칙을 찾습니다.
    pub fn get(&self, id: &str) -> Option<&DetectionRule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a DetectionRule;
    type IntoIter = std::slice::Iter<'a, DetectionRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
