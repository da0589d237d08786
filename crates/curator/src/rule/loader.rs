//! 규칙 파일 로더 -- YAML 큐레이션 문서를 디스크에서 로드합니다.
//!
//! 규칙 디렉토리를 재귀적으로 스캔하여 `.yml`/`.yaml` 파일을 파싱합니다.
//! 파일을 읽거나 역직렬화할 수 없으면 로딩 전체가 실패하고,
//! 의미 검증에 실패한 개별 규칙은 경고 로그를 남기고 건너뜁니다.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CuratorError;

use super::types::{CurationRule, RawCurationPackage};
use super::validate::{RuleRejection, validate_rule};

/// 로딩 결과
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// 검증을 통과한 규칙
    pub rules: Vec<CurationRule>,
    /// 거부된 규칙
    pub rejections: Vec<RuleRejection>,
    /// 읽은 규칙 파일 수
    pub files: usize,
}

/// 규칙 파일 로더
pub struct RuleLoader {
    max_file_size: u64,
    max_files: usize,
}

impl RuleLoader {
    /// 파일 크기/개수 제한으로 로더를 생성합니다.
    pub fn new(max_file_size: usize, max_files: usize) -> Self {
        Self {
            max_file_size: max_file_size as u64,
            max_files,
        }
    }

    /// 디렉토리에서 모든 YAML 규칙 파일을 로드합니다.
    ///
    /// `file_store`가 규칙 디렉토리 안에 있으면 그 하위는 건너뜁니다.
    /// 파일은 경로 순으로 처리되어 결과 순서가 결정적입니다.
    ///
    /// # Errors
    /// - 디렉토리를 읽을 수 없는 경우
    /// - 규칙 파일을 읽거나 파싱할 수 없는 경우
    /// - 파일 크기나 개수가 제한을 초과하는 경우
    pub fn load_directory(
        &self,
        dir: impl AsRef<Path>,
        file_store: impl AsRef<Path>,
    ) -> Result<LoadOutcome, CuratorError> {
        let dir = dir.as_ref();
        let file_store = file_store.as_ref();

        if !dir.is_dir() {
            return Err(CuratorError::RuleLoad {
                path: dir.display().to_string(),
                reason: "rule directory does not exist".to_owned(),
            });
        }

        let files = self.collect_files(dir, file_store)?;
        let mut outcome = LoadOutcome::default();

        for path in files {
            let packages = self.load_file(&path)?;
            outcome.files += 1;

            for raw in &packages {
                match validate_rule(raw, file_store, &path) {
                    Ok(rule) => outcome.rules.push(rule),
                    Err(rejection) => {
                        tracing::warn!(
                            rule_id = %rejection.rule_id,
                            path = %path.display(),
                            reason = %rejection.reason,
                            "curation rule rejected, skipping"
                        );
                        outcome.rejections.push(rejection);
                    }
                }
            }
        }

        tracing::info!(
            dir = %dir.display(),
            files = outcome.files,
            count = outcome.rules.len(),
            rejected = outcome.rejections.len(),
            "loaded curation rules"
        );

        Ok(outcome)
    }

    fn collect_files(&self, dir: &Path, file_store: &Path) -> Result<Vec<PathBuf>, CuratorError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_within(entry.path(), file_store));

        for entry in walker {
            let entry = entry.map_err(|e| CuratorError::RuleLoad {
                path: dir.display().to_string(),
                reason: format!("failed to read directory entry: {e}"),
            })?;

            let is_yaml = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "yml" || ext == "yaml");
            if !is_yaml {
                continue;
            }

            files.push(entry.into_path());
            if files.len() > self.max_files {
                return Err(CuratorError::RuleLoad {
                    path: dir.display().to_string(),
                    reason: format!("too many rule files: max {}", self.max_files),
                });
            }
        }

        Ok(files)
    }

    /// 단일 YAML 파일에서 큐레이션 패키지 목록을 로드합니다.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<RawCurationPackage>, CuratorError> {
        let path = path.as_ref();

        let metadata = std::fs::metadata(path).map_err(|e| CuratorError::RuleLoad {
            path: path.display().to_string(),
            reason: format!("failed to read file metadata: {e}"),
        })?;

        if metadata.len() > self.max_file_size {
            return Err(CuratorError::RuleLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {})",
                    metadata.len(),
                    self.max_file_size
                ),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CuratorError::RuleLoad {
            path: path.display().to_string(),
            reason: format!("failed to read file: {e}"),
        })?;

        parse_yaml(&content, &path.display().to_string())
    }
}

/// YAML 문자열을 큐레이션 패키지 목록으로 파싱합니다.
///
/// 빈 문서나 주석만 있는 문서는 빈 목록입니다.
pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<Vec<RawCurationPackage>, CuratorError> {
    let blank = yaml_str.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---"
    });
    if blank {
        return Ok(Vec::new());
    }
    let packages: Option<Vec<RawCurationPackage>> =
        serde_yaml::from_str(yaml_str).map_err(|e| CuratorError::RuleLoad {
            path: source.to_owned(),
            reason: format!("YAML parse error: {e}"),
        })?;
    Ok(packages.unwrap_or_default())
}

fn is_within(path: &Path, dir: &Path) -> bool {
    !dir.as_os_str().is_empty() && path.starts_with(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALID: &str = r#"
- id: "NPM:@types:node:[18.0,19.0)"
  package_modifier: update
  comment: "wrong license detected"
  curations:
    file_licenses:
      - file_scope: "index.d.ts"
        file_licenses:
          - modifier: delete
            reason: "false positive"
            license: "GPL-2.0-only"
            license_text_in_archive: "*"
"#;

    #[test]
    fn parse_valid_yaml() {
        let packages = parse_yaml(VALID, "test.yml").unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].id, "NPM:@types:node:[18.0,19.0)");
        assert_eq!(packages[0].package_modifier.as_deref(), Some("update"));
        assert_eq!(packages[0].file_items().len(), 1);
        assert_eq!(packages[0].file_items()[0].file_licenses.len(), 1);
    }

    #[test]
    fn parse_empty_and_null_documents() {
        assert!(parse_yaml("", "empty.yml").unwrap().is_empty());
        assert!(parse_yaml("# only a comment\n", "comment.yml").unwrap().is_empty());
        assert!(parse_yaml("~", "null.yml").unwrap().is_empty());
    }

    #[test]
    fn parse_invalid_yaml_returns_error() {
        let result = parse_yaml("not: [valid: yaml: {{{", "bad.yml");
        assert!(matches!(result, Err(CuratorError::RuleLoad { .. })));
    }

    #[test]
    fn parse_wrong_shape_returns_error() {
        let result = parse_yaml("id: single-map-not-a-list", "shape.yml");
        assert!(result.is_err());
    }

    #[test]
    fn load_directory_recurses_and_skips_file_store() {
        let root = TempDir::new().unwrap();
        let store = root.path().join("file-store");
        std::fs::create_dir_all(store.join("nested")).unwrap();
        std::fs::create_dir_all(root.path().join("npm")).unwrap();
        std::fs::write(root.path().join("npm/types.yml"), VALID).unwrap();
        std::fs::write(root.path().join("readme.md"), "not a rule").unwrap();
        std::fs::write(store.join("nested/decoy.yaml"), "{{{ broken").unwrap();

        let loader = RuleLoader::new(1024 * 1024, 100);
        let outcome = loader.load_directory(root.path(), &store).unwrap();
        assert_eq!(outcome.files, 1);
        assert_eq!(outcome.rules.len(), 1);
        assert!(outcome.rejections.is_empty());
    }

    #[test]
    fn invalid_rules_are_collected_not_fatal() {
        let root = TempDir::new().unwrap();
        let yaml = r#"
- id: "Maven:g:a:1.0"
  package_modifier: delete
  curations:
    file_licenses:
      - file_scope: LICENSE
- id: "Maven:g:b:1.0"
  package_modifier: delete
"#;
        std::fs::write(root.path().join("rules.yaml"), yaml).unwrap();

        let loader = RuleLoader::new(1024 * 1024, 100);
        let outcome = loader.load_directory(root.path(), root.path().join("store")).unwrap();
        assert_eq!(outcome.rules.len(), 1);
        assert_eq!(outcome.rejections.len(), 1);
        assert_eq!(outcome.rejections[0].rule_id, "Maven:g:a:1.0");
    }

    #[test]
    fn unparseable_file_is_fatal() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("broken.yml"), "- id: [unclosed").unwrap();
        let loader = RuleLoader::new(1024 * 1024, 100);
        let result = loader.load_directory(root.path(), root.path().join("store"));
        assert!(matches!(result, Err(CuratorError::RuleLoad { .. })));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("big.yml"), VALID).unwrap();
        let loader = RuleLoader::new(16, 100);
        assert!(loader.load_directory(root.path(), root.path().join("store")).is_err());
    }

    #[test]
    fn too_many_files_is_rejected() {
        let root = TempDir::new().unwrap();
        for i in 0..3 {
            std::fs::write(root.path().join(format!("r{i}.yml")), "").unwrap();
        }
        let loader = RuleLoader::new(1024, 2);
        assert!(loader.load_directory(root.path(), root.path().join("store")).is_err());
    }

    #[test]
    fn missing_directory_returns_error() {
        let loader = RuleLoader::new(1024, 10);
        assert!(loader.load_directory("/nonexistent/path/rules", "/nonexistent/store").is_err());
    }
}
