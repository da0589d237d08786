//! 큐레이션 규칙 저장소 -- YAML 규칙 로딩, 검증, 패키지별 조회
//!
//! # 규칙 형식
//! ```yaml
//! - id: "Maven:org.example:lib:[1.0,2.0)"
//!   package_modifier: update
//!   resolved_issues: ["W01", "E*"]
//!   curations:
//!     file_licenses:
//!       - file_scope: "src/**/*.java"
//!         file_licenses:
//!           - modifier: delete
//!             license: "*"
//!             license_text_in_archive: "*"
//!         file_copyrights:
//!           - modifier: delete
//!             copyright: "ACME *"
//! ```
//!
//! # 구성
//! - [`CurationRuleStore`]: 검증된 규칙 보관 및 패키지 조회
//! - [`loader`]: 디렉토리 스캔과 YAML 파싱
//! - [`validate`]: 규칙 의미 검증 (거부 사유별 변형)
//! - [`version`]: IVY 버전 범위
//! - [`types`]: 원본/검증 데이터 구조

pub mod loader;
pub mod types;
pub mod validate;
pub mod version;

pub use loader::{LoadOutcome, RuleLoader};
pub use types::{
    CopyrightCuration, CopyrightOp, CurationFileItem, CurationRule, LicenseCuration, LicenseOp,
    LicenseTextRef, LicenseValue, PackageOp, RawCurationPackage,
};
pub use validate::{RejectionReason, RuleRejection, validate_rule};
pub use version::IvyRange;

use std::path::{Path, PathBuf};

use clearance_core::types::PackageId;

use crate::config::CuratorConfig;
use crate::error::CuratorError;

/// 검증된 큐레이션 규칙 저장소
#[derive(Debug, Default)]
pub struct CurationRuleStore {
    rules: Vec<CurationRule>,
    rejections: Vec<RuleRejection>,
    file_store: PathBuf,
}

impl CurationRuleStore {
    /// 설정의 규칙 디렉토리와 파일 저장소에서 규칙을 로드합니다.
    pub fn load(config: &CuratorConfig) -> Result<Self, CuratorError> {
        Self::load_from(&config.rule_dir, &config.file_store, config)
    }

    /// 지정한 디렉토리에서 규칙을 로드합니다.
    pub fn load_from(
        rule_dir: impl AsRef<Path>,
        file_store: impl AsRef<Path>,
        config: &CuratorConfig,
    ) -> Result<Self, CuratorError> {
        let loader = RuleLoader::new(config.max_rule_file_size, config.max_rule_files);
        let outcome = loader.load_directory(rule_dir, file_store.as_ref())?;
        Ok(Self {
            rules: outcome.rules,
            rejections: outcome.rejections,
            file_store: file_store.as_ref().to_path_buf(),
        })
    }

    /// 이미 검증된 규칙으로 저장소를 구성합니다.
    pub fn from_rules(rules: Vec<CurationRule>, file_store: impl Into<PathBuf>) -> Self {
        Self {
            rules,
            rejections: Vec::new(),
            file_store: file_store.into(),
        }
    }

    /// 패키지에 적용할 규칙을 찾습니다.
    ///
    /// 둘 이상의 규칙이 일치하면 [`CuratorError::AmbiguousRule`]을 반환하며,
    /// 이 경우 해당 패키지에는 어떤 규칙도 적용하지 않아야 합니다.
    pub fn find_rule_for(&self, id: &PackageId) -> Result<Option<&CurationRule>, CuratorError> {
        let mut matching = self.rules.iter().filter(|r| r.matches(id));
        let first = matching.next();
        let rest: Vec<&CurationRule> = matching.collect();
        match (first, rest.is_empty()) {
            (None, _) => Ok(None),
            (Some(rule), true) => Ok(Some(rule)),
            (Some(rule), false) => Err(CuratorError::AmbiguousRule {
                package: id.to_string(),
                rules: std::iter::once(rule)
                    .chain(rest)
                    .map(|r| r.id.clone())
                    .collect(),
            }),
        }
    }

    /// 지정한 패키지 수정자의 규칙 (적용 순서대로)
    pub fn rules_with(&self, op: PackageOp) -> impl Iterator<Item = &CurationRule> {
        self.rules.iter().filter(move |r| r.op == op)
    }

    /// 검증된 모든 규칙
    pub fn rules(&self) -> &[CurationRule] {
        &self.rules
    }

    /// 거부된 규칙
    pub fn rejections(&self) -> &[RuleRejection] {
        &self.rejections
    }

    /// 라이선스 텍스트 파일 저장소
    pub fn file_store(&self) -> &Path {
        &self.file_store
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_rules(dir: &TempDir, name: &str, yaml: &str) {
        std::fs::write(dir.path().join(name), yaml).unwrap();
    }

    fn store(yaml: &str) -> (TempDir, CurationRuleStore) {
        let dir = TempDir::new().unwrap();
        write_rules(&dir, "rules.yml", yaml);
        let config = CuratorConfig::default();
        let store =
            CurationRuleStore::load_from(dir.path(), dir.path().join("store"), &config).unwrap();
        (dir, store)
    }

    #[test]
    fn find_rule_matches_version_range() {
        let (_dir, store) = store(
            r#"
- id: "Maven:org.example:lib:[1.0,2.0)"
  package_modifier: delete
"#,
        );
        let inside = PackageId::new("Maven", "org.example", "lib", "1.4");
        let outside = PackageId::new("Maven", "org.example", "lib", "2.0");
        let other = PackageId::new("Maven", "org.example", "other", "1.4");

        assert!(store.find_rule_for(&inside).unwrap().is_some());
        assert!(store.find_rule_for(&outside).unwrap().is_none());
        assert!(store.find_rule_for(&other).unwrap().is_none());
    }

    #[test]
    fn overlapping_rules_are_ambiguous() {
        let (_dir, store) = store(
            r#"
- id: "NPM:@scope:pkg:[1.0,)"
  package_modifier: delete
- id: "NPM:@scope:pkg:1.+"
  package_modifier: update
"#,
        );
        let id = PackageId::new("NPM", "@scope", "pkg", "1.2");
        let err = store.find_rule_for(&id).unwrap_err();
        match err {
            CuratorError::AmbiguousRule { rules, .. } => assert_eq!(rules.len(), 2),
            other => panic!("unexpected error: {other}"),
        }

        let only_first = PackageId::new("NPM", "@scope", "pkg", "3.0");
        assert!(store.find_rule_for(&only_first).unwrap().is_some());
    }

    #[test]
    fn rejected_rules_are_kept_for_reporting() {
        let (_dir, store) = store(
            r#"
- id: "Maven:g:a:1.0"
  package_modifier: insert
"#,
        );
        assert!(store.is_empty());
        assert_eq!(store.rejections().len(), 1);
        assert_eq!(
            store.rejections()[0].reason,
            RejectionReason::MissingRepository
        );
    }

    #[test]
    fn rules_with_filters_by_modifier() {
        let (_dir, store) = store(
            r#"
- id: "Maven:g:a:1.0"
  package_modifier: delete
- id: "Maven:g:b:1.0"
  package_modifier: update
- id: "Maven:g:c:1.0"
  package_modifier: delete
"#,
        );
        assert_eq!(store.len(), 3);
        assert_eq!(store.rules_with(PackageOp::Delete).count(), 2);
        assert_eq!(store.rules_with(PackageOp::Insert).count(), 0);
    }
}
