//! 룰 매칭 벤치마크
//!
//! 수정자별 매칭 비용과 규칙 수에 따른 엔진 스케일링을 측정합니다.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use logsieve_core::types::{LogFormat, LogRecord};
use logsieve_detection::rule::{DetectionRule, RuleLoader, RuleSet};
use logsieve_detection::DetectionEngine;

fn create_record(message: &str) -> LogRecord {
    let mut record = LogRecord::new(LogFormat::Syslog, "2024-01-15T12:00:00.000");
    record.hostname = "web-server-01".to_owned();
    record.program = "sshd[1234]".to_owned();
    record.pid = "1234".to_owned();
    record.message = message.to_owned();
    record
        .fields
        .insert("source_ip".to_owned(), "192.168.1.100".to_owned());
    record
}

fn create_rule(id: &str, criterion: &str) -> DetectionRule {
    let yaml = format!(
        "id: {id}\ntitle: Rule {id}\nlogsource:\n  service: syslog\ndetection:\n  selection:\n    message: '{criterion}'\n  condition: selection\n"
    );
    RuleLoader::parse_yaml(&yaml, "bench.yml").unwrap()
}

fn create_two_block_rule(id: &str) -> DetectionRule {
    let yaml = format!(
        "id: {id}\ntitle: Rule {id}\ndetection:\n  sel_proc:\n    program: '|startswith|sshd'\n  sel_msg:\n    message: ['invalid user', 'failed password', '|re|authentication failure']\n  condition: sel_proc and sel_msg\n"
    );
    RuleLoader::parse_yaml(&yaml, "bench.yml").unwrap()
}

fn bench_modifiers(c: &mut Criterion) {
    let record = create_record("Failed password for root from 192.168.1.100 port 22 ssh2");
    let mut group = c.benchmark_group("modifier");
    group.throughput(Throughput::Elements(1));

    for (name, criterion) in [
        ("contains_default", "failed password"),
        ("startswith", "|startswith|failed"),
        ("endswith", "|endswith|ssh2"),
        ("regex", r"|re|from \d+\.\d+\.\d+\.\d+ port \d+"),
    ] {
        let engine = DetectionEngine::new(RuleSet::new(vec![create_rule(name, criterion)]).unwrap());
        group.bench_function(name, |b| b.iter(|| engine.evaluate(black_box(&record))));
    }

    let engine = DetectionEngine::new(RuleSet::new(vec![create_two_block_rule("two_blocks")]).unwrap());
    group.bench_function("and_two_blocks", |b| {
        b.iter(|| engine.evaluate(black_box(&record)))
    });

    group.finish();
}

fn bench_rule_scaling(c: &mut Criterion) {
    let record = create_record("Accepted publickey for alice from 10.0.0.1 port 50022 ssh2");
    let mut group = c.benchmark_group("rule_scaling");

    for count in [10usize, 100, 1000] {
        let rules = (0..count)
            .map(|i| create_rule(&format!("rule_{i}"), &format!("needle-{i}")))
            .collect();
        let engine = DetectionEngine::new(RuleSet::new(rules).unwrap());

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &engine, |b, engine| {
            b.iter(|| engine.evaluate(black_box(&record)))
        });
    }

    group.finish();
}

fn bench_rule_parsing(c: &mut Criterion) {
    let yaml = "id: parse_bench\ntitle: Parse bench\nlevel: high\ntags: [a, b]\nlogsource:\n  product: linux\n  service: syslog\ndetection:\n  sel_a:\n    program: sshd\n    message: ['|re|^Failed', 'invalid user']\n  sel_b:\n    hostname:\n      endswith: '.internal'\n  condition: sel_a or sel_b\n";
    c.bench_function("parse_yaml_rule", |b| {
        b.iter(|| RuleLoader::parse_yaml(black_box(yaml), "bench.yml").unwrap())
    });
}

criterion_group!(benches, bench_modifiers, bench_rule_scaling, bench_rule_parsing);
criterion_main!(benches);
