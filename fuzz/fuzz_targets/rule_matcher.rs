#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logsieve_core::types::{LogFormat, LogRecord};
use logsieve_detection::rule::{Condition, Criteria, FieldCriterion, SelectionBlock, StringMatch};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// selection 블록 목록 (최대 4개로 제한)
    blocks: Vec<FuzzBlock>,
    /// 조건식 원문
    condition: String,
    /// 매칭 대상 레코드 필드값
    message: String,
    program: String,
    hostname: String,
}

#[derive(Arbitrary, Debug)]
struct FuzzBlock {
    name: String,
    criteria: Vec<FuzzCriterion>,
}

#[derive(Arbitrary, Debug)]
struct FuzzCriterion {
    field: FuzzField,
    patterns: Vec<String>,
}

#[derive(Arbitrary, Debug)]
enum FuzzField {
    Message,
    Program,
    Hostname,
    Custom,
}

impl FuzzField {
    fn as_str(&self) -> &str {
        match self {
            FuzzField::Message => "message",
            FuzzField::Program => "program",
            FuzzField::Hostname => "hostname",
            FuzzField::Custom => "uid",
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let blocks: Vec<SelectionBlock> = input
        .blocks
        .iter()
        .take(4)
        .map(|b| SelectionBlock {
            name: b.name.to_lowercase(),
            criteria: b
                .criteria
                .iter()
                .take(8)
                .map(|c| FieldCriterion {
                    field: c.field.as_str().to_owned(),
                    criteria: Criteria::AnyOf(
                        c.patterns
                            .iter()
                            .take(4)
                            .map(|p| StringMatch::parse(p, "fuzz_rule"))
                            .collect(),
                    ),
                })
                .collect(),
        })
        .collect();

    let mut record = LogRecord::new(LogFormat::Syslog, "2025-01-01T00:00:00.000");
    record.message = input.message;
    record.program = input.program;
    record.hostname = input.hostname;

    // 평가는 어떤 입력에서도 패닉 없이 bool을 반환해야 함
    let _ = Condition::parse(&input.condition).evaluate(&blocks, &record);
});
