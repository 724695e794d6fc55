//! 규칙 파일 로더 -- YAML 규칙 파일을 디스크에서 로드합니다.
//!
//! 설정된 디렉토리들을 재귀적으로 탐색하여 `.yml`/`.yaml` 파일을 파싱합니다.
//! 개별 파일이나 디렉토리의 실패는 경고 로그를 남기고 건너뛰며, 로딩 전체가 실패하지는 않습니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use logsieve_core::metrics as m;

use super::RuleSet;
use super::types::{DetectionRule, RawRule};
use crate::error::EngineError;

/// 규칙 파일 최대 크기
pub const MAX_RULE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// 규칙 루트 아래의 표준 하위 디렉토리
const STANDARD_SUBDIRS: &[&[&str]] = &[
    &["linux"],
    &["linux", "syslog"],
    &["linux", "journald"],
    &["linux", "auditd"],
    &["external"],
    &["external", "chopchopgo"],
    &["external", "sigmahq"],
    &["external", "custom"],
];

/// 규칙 파일 로더
pub struct RuleLoader;

impl RuleLoader {
    /// 표준 규칙 디렉토리 구성을 반환합니다.
    ///
    /// 루트 자신과 `linux/{syslog,journald,auditd}`, `external/{chopchopgo,sigmahq,custom}`을
    /// 포함합니다. 같은 파일이 여러 경로로 발견되어도 한 번만 로드됩니다.
    pub fn standard_layout(root: impl AsRef<Path>) -> Vec<PathBuf> {
        let root = root.as_ref();
        std::iter::once(root.to_path_buf())
            .chain(STANDARD_SUBDIRS.iter().map(|parts| {
                parts
                    .iter()
                    .fold(root.to_path_buf(), |path, part| path.join(part))
            }))
            .collect()
    }

    /// 여러 디렉토리에서 규칙을 로드합니다.
    ///
    /// 존재하지 않는 디렉토리는 경고와 함께 규칙 0개로 취급합니다.
    /// 같은 파일(정규화된 경로 기준)은 한 번만 읽고, 중복 ID는 먼저 로드된 규칙을 유지합니다.
    pub async fn load_directories<P: AsRef<Path>>(dirs: &[P]) -> RuleSet {
        let mut seen_files = HashSet::new();
        let mut seen_ids = HashSet::new();
        let mut rules = Vec::new();
        let mut skipped = 0u64;

        for dir in dirs {
            let dir = dir.as_ref();
            let files = collect_rule_files(dir, &mut seen_files).await;

            for path in files {
                match Self::load_file(&path).await {
                    Ok(rule) => {
                        if !seen_ids.insert(rule.id.clone()) {
                            tracing::warn!(
                                rule_id = %rule.id,
                                path = %path.display(),
                                "duplicate rule id, skipping"
                            );
                            skipped += 1;
                            continue;
                        }
                        rules.push(rule);
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to load rule file, skipping"
                        );
                        skipped += 1;
                    }
                }
            }
        }

        metrics::gauge!(m::RULES_LOADED).set(rules.len() as f64);
        if skipped > 0 {
            metrics::counter!(m::RULES_SKIPPED_TOTAL).increment(skipped);
        }

        tracing::info!(
            dirs = dirs.len(),
            loaded = rules.len(),
            skipped,
            "loaded detection rules"
        );

        RuleSet::from_unique(rules)
    }

    /// 디렉토리 하나에서 규칙을 로드합니다.
    pub async fn load_directory(dir: impl AsRef<Path>) -> RuleSet {
        Self::load_directories(&[dir.as_ref()]).await
    }

    /// 단일 YAML 파일에서 규칙을 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<DetectionRule, EngineError> {
        let path = path.as_ref();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| EngineError::RuleLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_RULE_FILE_SIZE {
            return Err(EngineError::RuleLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_RULE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| EngineError::RuleLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        Self::parse_yaml(&content, &path.display().to_string())
    }

    /// YAML 문자열을 파싱하여 규칙을 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<DetectionRule, EngineError> {
        let raw: RawRule = serde_yaml::from_str(yaml_str).map_err(|e| EngineError::RuleLoad {
            path: source.to_owned(),
            reason: format!("YAML parse error: {e}"),
        })?;

        DetectionRule::from_raw(raw, source)
    }
}

fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yml" || ext == "yaml")
}

/// 디렉토리를 재귀적으로 탐색하여 아직 보지 않은 규칙 파일 목록을 반환합니다.
///
/// 각 디렉토리의 항목은 이름순으로 방문합니다. 심볼릭 링크를 따라가되
/// 정규화된 경로로 방문 여부를 기록하므로 순환 링크에서도 종료됩니다.
async fn collect_rule_files(root: &Path, seen_files: &mut HashSet<PathBuf>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut visited_dirs = HashSet::new();

    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            tracing::warn!(dir = %root.display(), "rule path is not a directory, skipping");
            return files;
        }
        Err(e) => {
            tracing::warn!(dir = %root.display(), error = %e, "rule directory not accessible, skipping");
            return files;
        }
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let canonical = tokio::fs::canonicalize(&dir).await.unwrap_or_else(|_| dir.clone());
        if !visited_dirs.insert(canonical) {
            continue;
        }

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to read rule directory");
                continue;
            }
        };

        let mut children = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => children.push(entry.path()),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                    break;
                }
            }
        }
        children.sort();

        let mut subdirs = Vec::new();
        for path in children {
            let meta = match tokio::fs::metadata(&path).await {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to stat rule path");
                    continue;
                }
            };

            if meta.is_dir() {
                subdirs.push(path);
            } else if meta.is_file() && is_rule_file(&path) {
                let canonical = tokio::fs::canonicalize(&path)
                    .await
                    .unwrap_or_else(|_| path.clone());
                if seen_files.insert(canonical) {
                    files.push(path);
                }
            }
        }

        // 이름순 방문을 위해 역순으로 쌓음
        stack.extend(subdirs.into_iter().rev());
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const RULE: &str = r#"
id: test_rule
title: Test Rule
level: medium
detection:
  selection:
    message: "test message"
  condition: selection
"#;

    fn rule_yaml(id: &str) -> String {
        format!(
            "id: {id}\ntitle: Rule {id}\ndetection:\n  selection:\n    message: x\n  condition: selection\n"
        )
    }

    #[test]
    fn parse_valid_yaml() {
        let rule = RuleLoader::parse_yaml(RULE, "test.yml").unwrap();
        assert_eq!(rule.id, "test_rule");
        assert_eq!(rule.level, Some(logsieve_core::types::Severity::Medium));
    }

    #[test]
    fn parse_invalid_yaml_returns_error() {
        let result = RuleLoader::parse_yaml("not: [valid: yaml: {{{", "bad.yml");
        assert!(matches!(result, Err(EngineError::RuleLoad { .. })));
    }

    #[test]
    fn parse_yaml_with_empty_id() {
        let yaml = "id: \"\"\ntitle: \"\"\ndetection:\n  selection:\n    message: x\n  condition: selection\n";
        assert!(RuleLoader::parse_yaml(yaml, "empty_id.yml").is_err());
    }

    #[test]
    fn standard_layout_paths() {
        let layout = RuleLoader::standard_layout("/rules");
        assert_eq!(layout.len(), 9);
        assert_eq!(layout[0], PathBuf::from("/rules"));
        assert!(layout.contains(&PathBuf::from("/rules/linux/auditd")));
        assert!(layout.contains(&PathBuf::from("/rules/external/sigmahq")));
    }

    #[tokio::test]
    async fn load_nonexistent_directory_yields_empty_set() {
        let rules = RuleLoader::load_directory("/nonexistent/path/rules").await;
        assert!(rules.is_empty());
    }

    #[tokio::test]
    async fn load_recursively_and_skip_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("linux").join("syslog");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a.yml"), rule_yaml("a")).unwrap();
        fs::write(nested.join("b.yaml"), rule_yaml("b")).unwrap();
        fs::write(nested.join("broken.yml"), "id: [").unwrap();
        fs::write(nested.join("notes.txt"), rule_yaml("c")).unwrap();

        let rules = RuleLoader::load_directory(dir.path()).await;
        let mut ids: Vec<_> = rules.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn overlapping_directories_load_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("external").join("sigmahq");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("one.yml"), rule_yaml("one")).unwrap();

        let layout = RuleLoader::standard_layout(dir.path());
        let rules = RuleLoader::load_directories(&layout).await;
        assert_eq!(rules.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_ids_keep_first_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1_first.yml"), rule_yaml("dup")).unwrap();
        let second = rule_yaml("dup").replace("Rule dup", "Second");
        fs::write(dir.path().join("2_second.yml"), second).unwrap();

        let rules = RuleLoader::load_directory(dir.path()).await;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.get("dup").unwrap().title, "Rule dup");
    }

    #[tokio::test]
    async fn oversized_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.yml");
        let file = fs::File::create(&path).unwrap();
        file.set_len(MAX_RULE_FILE_SIZE + 1).unwrap();

        let err = RuleLoader::load_file(&path).await.unwrap_err();
        assert!(err.to_string().contains("file too large"));
    }

    #[tokio::test]
    async fn file_path_instead_of_directory_yields_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rule.yml");
        fs::write(&path, rule_yaml("x")).unwrap();

        assert!(RuleLoader::load_directory(&path).await.is_empty());
    }
}
