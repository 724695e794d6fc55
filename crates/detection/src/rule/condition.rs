//! 조건식 평가
//!
//! 조건식은 의도적으로 제한된 문법입니다. 괄호, 부정, and/or 혼합 우선순위는 지원하지 않으며,
//! ` and `가 ` or `보다 먼저 검사됩니다. 따라서 `a and b or c`는 `a`와 `b or c`의 AND가 되고,
//! `b or c`라는 이름의 블록은 없으므로 거짓입니다.

use std::fmt;

use logsieve_core::types::LogRecord;

use super::matcher::SelectionBlock;

/// 조건식이 비어 있을 때 사용하는 기본값
pub const DEFAULT_CONDITION: &str = "selection";

/// 파싱된 조건식
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `selection`: 블록이 하나 이상 있고 모든 블록이 참
    AllBlocks,
    /// `a and b`: 모든 이름의 블록이 참 (알 수 없는 이름은 거짓)
    All(Vec<String>),
    /// `a or b`: 하나 이상의 블록이 참
    Any(Vec<String>),
    /// 블록 하나를 직접 참조
    Block(String),
}

impl Condition {
    /// 조건식 문자열을 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn parse(expr: &str) -> Self {
        let expr = expr.trim().to_lowercase();
        let expr = if expr.is_empty() {
            DEFAULT_CONDITION.to_owned()
        } else {
            expr
        };

        if expr == DEFAULT_CONDITION {
            return Self::AllBlocks;
        }
        if expr.contains(" and ") {
            return Self::All(split_names(&expr, " and "));
        }
        if expr.contains(" or ") {
            return Self::Any(split_names(&expr, " or "));
        }
        Self::Block(expr)
    }

    /// 조건식이 참조하는 블록 이름 목록
    pub fn referenced_blocks(&self) -> Vec<&str> {
        match self {
            Self::AllBlocks => Vec::new(),
            Self::All(names) | Self::Any(names) => names.iter().map(String::as_str).collect(),
            Self::Block(name) => vec![name.as_str()],
        }
    }

    /// 블록 목록에 대해 조건식을 평가합니다.
    pub fn evaluate(&self, blocks: &[SelectionBlock], record: &LogRecord) -> bool {
        let block = |name: &str| {
            blocks
                .iter()
                .find(|b| b.name == name)
                .is_some_and(|b| b.matches(record))
        };

        match self {
            Self::AllBlocks => !blocks.is_empty() && blocks.iter().all(|b| b.matches(record)),
            Self::All(names) => names.iter().all(|n| block(n)),
            Self::Any(names) => names.iter().any(|n| block(n)),
            Self::Block(name) => block(name),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllBlocks => f.write_str(DEFAULT_CONDITION),
            Self::All(names) => f.write_str(&names.join(" and ")),
            Self::Any(names) => f.write_str(&names.join(" or ")),
            Self::Block(name) => f.write_str(name),
        }
    }
}

fn split_names(expr: &str, separator: &str) -> Vec<String> {
    expr.split(separator)
        .map(|part| part.trim().to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::matcher::{Criteria, FieldCriterion, StringMatch};
    use logsieve_core::types::LogFormat;

    fn block(name: &str, needle: &str) -> SelectionBlock {
        SelectionBlock {
            name: name.to_owned(),
            criteria: vec![FieldCriterion {
                field: "message".to_owned(),
                criteria: Criteria::Single(StringMatch::parse(needle, "test")),
            }],
        }
    }

    fn record(message: &str) -> LogRecord {
        let mut record = LogRecord::new(LogFormat::Syslog, "2025-01-01T00:00:00.000");
        record.message = message.to_owned();
        record
    }

    #[test]
    fn parse_forms() {
        assert_eq!(Condition::parse(""), Condition::AllBlocks);
        assert_eq!(Condition::parse("  "), Condition::AllBlocks);
        assert_eq!(Condition::parse("Selection"), Condition::AllBlocks);
        assert_eq!(
            Condition::parse("sel_a and sel_b"),
            Condition::All(vec!["sel_a".to_owned(), "sel_b".to_owned()])
        );
        assert_eq!(
            Condition::parse("sel_a OR sel_b"),
            Condition::Any(vec!["sel_a".to_owned(), "sel_b".to_owned()])
        );
        assert_eq!(Condition::parse("Keywords"), Condition::Block("keywords".to_owned()));
    }

    #[test]
    fn and_is_checked_before_or() {
        assert_eq!(
            Condition::parse("a and b or c"),
            Condition::All(vec!["a".to_owned(), "b or c".to_owned()])
        );
    }

    #[test]
    fn unsupported_syntax_falls_through() {
        assert_eq!(Condition::parse("not a"), Condition::Block("not a".to_owned()));
        assert_eq!(
            Condition::parse("1 of selection*"),
            Condition::Block("1 of selection*".to_owned())
        );
    }

    #[test]
    fn selection_requires_all_blocks() {
        let blocks = vec![block("sel_a", "alpha"), block("sel_b", "beta")];
        let cond = Condition::parse("selection");
        assert!(cond.evaluate(&blocks, &record("alpha beta")));
        assert!(!cond.evaluate(&blocks, &record("alpha only")));
    }

    #[test]
    fn selection_with_no_blocks_is_false() {
        assert!(!Condition::AllBlocks.evaluate(&[], &record("anything")));
    }

    #[test]
    fn and_condition() {
        let blocks = vec![block("sel_a", "alpha"), block("sel_b", "beta")];
        let cond = Condition::parse("sel_a and sel_b");
        assert!(cond.evaluate(&blocks, &record("alpha beta")));
        assert!(!cond.evaluate(&blocks, &record("alpha")));
        assert!(!cond.evaluate(&blocks, &record("beta")));
    }

    #[test]
    fn or_condition() {
        let blocks = vec![block("sel_a", "alpha"), block("sel_b", "beta")];
        let cond = Condition::parse("sel_a or sel_b");
        assert!(cond.evaluate(&blocks, &record("alpha")));
        assert!(cond.evaluate(&blocks, &record("beta")));
        assert!(!cond.evaluate(&blocks, &record("gamma")));
    }

    #[test]
    fn unknown_block_name_is_false() {
        let blocks = vec![block("sel_a", "alpha")];
        assert!(!Condition::parse("sel_a and missing").evaluate(&blocks, &record("alpha")));
        assert!(Condition::parse("sel_a or missing").evaluate(&blocks, &record("alpha")));
        assert!(!Condition::parse("missing").evaluate(&blocks, &record("alpha")));
    }

    #[test]
    fn direct_block_reference() {
        let blocks = vec![block("keywords", "panic"), block("filter", "test")];
        let cond = Condition::parse("keywords");
        assert!(cond.evaluate(&blocks, &record("kernel panic")));
        assert!(!cond.evaluate(&blocks, &record("all good")));
    }

    #[test]
    fn display_round_trips_names() {
        assert_eq!(Condition::parse("A and B").to_string(), "a and b");
        assert_eq!(Condition::AllBlocks.to_string(), "selection");
        assert_eq!(
            Condition::parse("x or y").referenced_blocks(),
            vec!["x", "y"]
        );
    }
}
