//! 큐레이터 설정
//!
//! [`CuratorConfig`]는 core의 `scope`, `curation`, `dedup` 섹션을 하나로 모으고
//! 큐레이터 고유 설정(규칙 파일 크기 제한, 최대 규칙 파일 수)을 추가합니다.
//! 전역 상태 없이 [`ScopeClassifier`](crate::scope::ScopeClassifier),
//! [`CurationRuleStore`](crate::rule::CurationRuleStore),
//! [`ScopeConsolidator`](crate::consolidate::ScopeConsolidator),
//! [`CurationEngine`](crate::engine::CurationEngine)에 참조로 전달됩니다.
//!
//! # 사용 예시
//!
//! ```
//! use clearance_curator::{CuratorConfig, CuratorConfigBuilder};
//!
//! let config = CuratorConfig::default();
//! config.validate().unwrap();
//!
//! let config = CuratorConfigBuilder::new()
//!     .scope_patterns(vec!["LICENSE".to_owned(), "NOTICE".to_owned()])
//!     .preserve_file_scopes(true)
//!     .build()
//!     .unwrap();
//! assert!(config.preserve_file_scopes);
//! ```

use serde::{Deserialize, Serialize};

use clearance_core::config::ClearanceConfig;
use clearance_core::types::IssueLevel;

use crate::error::CuratorError;

/// 규칙 파일 최대 크기 상한 (바이트)
const MAX_RULE_FILE_SIZE_LIMIT: usize = 64 * 1024 * 1024;
/// 규칙 파일 수 상한
const MAX_RULE_FILES_LIMIT: usize = 100_000;

/// 큐레이터 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratorConfig {
    /// 라이선스 DIR/DEFAULT 스코프 파일 이름 패턴
    pub scope_patterns: Vec<String>,
    /// 저작권 DIR/DEFAULT 스코프 파일 이름 패턴
    pub copyright_scope_patterns: Vec<String>,
    /// 항상 FILE 스코프로 분류할 패턴
    pub ignore_patterns: Vec<String>,
    /// 소문자 비교 여부
    pub lowercase: bool,

    /// 큐레이션 활성화 여부
    pub curation_enabled: bool,
    /// 규칙 디렉토리
    pub rule_dir: String,
    /// 라이선스 텍스트 저장소
    pub file_store: String,
    /// 아카이브 스테이징 디렉토리
    pub archive_dir: String,
    /// 출력에 남길 최소 이슈 레벨
    pub min_issue_level: IssueLevel,

    /// 중복 제거 활성화 여부
    pub dedup_enabled: bool,
    /// 중복이어도 파일 레벨 항목 보존
    pub preserve_file_scopes: bool,
    /// 고유 항목 기준 비교
    pub compare_only_distinct: bool,

    // --- 모듈 고유 확장 ---
    /// 규칙 파일 최대 크기 (바이트)
    pub max_rule_file_size: usize,
    /// 최대 규칙 파일 수
    pub max_rule_files: usize,
}

impl Default for CuratorConfig {
    fn default() -> Self {
        Self::from_core(&ClearanceConfig::default())
    }
}

impl CuratorConfig {
    /// core 설정에서 큐레이터 설정을 생성합니다.
    ///
    /// 알 수 없는 이슈 레벨은 `Warn`으로 대체합니다.
    pub fn from_core(core: &ClearanceConfig) -> Self {
        Self {
            scope_patterns: core.scope.scope_patterns.clone(),
            copyright_scope_patterns: core.scope.copyright_scope_patterns.clone(),
            ignore_patterns: core.scope.ignore_patterns.clone(),
            lowercase: core.scope.lowercase,
            curation_enabled: core.curation.enabled,
            rule_dir: core.curation.rule_dir.clone(),
            file_store: core.curation.file_store.clone(),
            archive_dir: core.curation.archive_dir.clone(),
            min_issue_level: core.curation.min_issue_level().unwrap_or(IssueLevel::Warn),
            dedup_enabled: core.dedup.enabled,
            preserve_file_scopes: core.dedup.preserve_file_scopes,
            compare_only_distinct: core.dedup.compare_only_distinct,
            max_rule_file_size: 10 * 1024 * 1024, // 10 MB
            max_rule_files: 10_000,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CuratorError> {
        for pattern in self
            .scope_patterns
            .iter()
            .chain(&self.copyright_scope_patterns)
            .chain(&self.ignore_patterns)
        {
            if pattern.trim().is_empty() {
                return Err(CuratorError::Config {
                    field: "scope_patterns".to_owned(),
                    reason: "patterns must not be empty".to_owned(),
                });
            }
            if pattern.contains('/') {
                return Err(CuratorError::Config {
                    field: "scope_patterns".to_owned(),
                    reason: format!("'{pattern}' must match a file name, not a path"),
                });
            }
        }

        if self.curation_enabled && self.rule_dir.is_empty() {
            return Err(CuratorError::Config {
                field: "rule_dir".to_owned(),
                reason: "rule_dir must not be empty when curation is enabled".to_owned(),
            });
        }

        if self.curation_enabled && self.archive_dir.is_empty() {
            return Err(CuratorError::Config {
                field: "archive_dir".to_owned(),
                reason: "archive_dir must not be empty when curation is enabled".to_owned(),
            });
        }

        if self.max_rule_file_size == 0 || self.max_rule_file_size > MAX_RULE_FILE_SIZE_LIMIT {
            return Err(CuratorError::Config {
                field: "max_rule_file_size".to_owned(),
                reason: format!("must be 1-{MAX_RULE_FILE_SIZE_LIMIT}"),
            });
        }

        if self.max_rule_files == 0 || self.max_rule_files > MAX_RULE_FILES_LIMIT {
            return Err(CuratorError::Config {
                field: "max_rule_files".to_owned(),
                reason: format!("must be 1-{MAX_RULE_FILES_LIMIT}"),
            });
        }

        Ok(())
    }
}

/// 큐레이터 설정 빌더
#[derive(Debug, Default)]
pub struct CuratorConfigBuilder {
    config: CuratorConfig,
}

impl CuratorConfigBuilder {
    /// 기본값으로 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.scope_patterns = patterns;
        self
    }

    pub fn copyright_scope_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.copyright_scope_patterns = patterns;
        self
    }

    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.ignore_patterns = patterns;
        self
    }

    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.config.lowercase = lowercase;
        self
    }

    pub fn curation_enabled(mut self, enabled: bool) -> Self {
        self.config.curation_enabled = enabled;
        self
    }

    pub fn rule_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.rule_dir = dir.into();
        self
    }

    pub fn file_store(mut self, dir: impl Into<String>) -> Self {
        self.config.file_store = dir.into();
        self
    }

    pub fn archive_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.archive_dir = dir.into();
        self
    }

    pub fn min_issue_level(mut self, level: IssueLevel) -> Self {
        self.config.min_issue_level = level;
        self
    }

    pub fn dedup_enabled(mut self, enabled: bool) -> Self {
        self.config.dedup_enabled = enabled;
        self
    }

    pub fn preserve_file_scopes(mut self, preserve: bool) -> Self {
        self.config.preserve_file_scopes = preserve;
        self
    }

    pub fn compare_only_distinct(mut self, distinct: bool) -> Self {
        self.config.compare_only_distinct = distinct;
        self
    }

    pub fn max_rule_file_size(mut self, size: usize) -> Self {
        self.config.max_rule_file_size = size;
        self
    }

    pub fn max_rule_files(mut self, max: usize) -> Self {
        self.config.max_rule_files = max;
        self
    }

    /// 설정을 검증하고 반환합니다.
    pub fn build(self) -> Result<CuratorConfig, CuratorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
