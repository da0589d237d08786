//! 설정 관리 -- clearance.toml 파싱 및 런타임 설정
//!
//! [`ClearanceConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//! 전역 상태 없이 시작 시 한 번 생성되어 각 진입점에 명시적으로 전달됩니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`CLEARANCE_CURATION_RULE_DIR=curations` 형식)
//! 3. 설정 파일 (`clearance.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # fn example() -> Result<(), clearance_core::error::ClearanceError> {
//! use clearance_core::config::ClearanceConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ClearanceConfig::load("clearance.toml")?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ClearanceConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ClearanceError, ConfigError};
use crate::types::IssueLevel;

/// Clearance 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClearanceConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스코프 분류 설정
    #[serde(default)]
    pub scope: ScopeConfig,
    /// 큐레이션 설정
    #[serde(default)]
    pub curation: CurationConfig,
    /// 중복 제거 설정
    #[serde(default)]
    pub dedup: DedupConfig,
}

impl ClearanceConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClearanceError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClearanceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClearanceError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ClearanceError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ClearanceError> {
        toml::from_str(toml_str).map_err(|e| {
            ClearanceError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `CLEARANCE_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "CLEARANCE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "CLEARANCE_GENERAL_LOG_FORMAT");

        // Scope
        override_csv(
            &mut self.scope.scope_patterns,
            "CLEARANCE_SCOPE_SCOPE_PATTERNS",
        );
        override_csv(
            &mut self.scope.copyright_scope_patterns,
            "CLEARANCE_SCOPE_COPYRIGHT_SCOPE_PATTERNS",
        );
        override_csv(
            &mut self.scope.ignore_patterns,
            "CLEARANCE_SCOPE_IGNORE_PATTERNS",
        );
        override_bool(&mut self.scope.lowercase, "CLEARANCE_SCOPE_LOWERCASE");

        // Curation
        override_bool(&mut self.curation.enabled, "CLEARANCE_CURATION_ENABLED");
        override_string(&mut self.curation.rule_dir, "CLEARANCE_CURATION_RULE_DIR");
        override_string(
            &mut self.curation.file_store,
            "CLEARANCE_CURATION_FILE_STORE",
        );
        override_string(
            &mut self.curation.archive_dir,
            "CLEARANCE_CURATION_ARCHIVE_DIR",
        );
        override_string(
            &mut self.curation.issue_level,
            "CLEARANCE_CURATION_ISSUE_LEVEL",
        );

        // Dedup
        override_bool(&mut self.dedup.enabled, "CLEARANCE_DEDUP_ENABLED");
        override_bool(
            &mut self.dedup.preserve_file_scopes,
            "CLEARANCE_DEDUP_PRESERVE_FILE_SCOPES",
        );
        override_bool(
            &mut self.dedup.compare_only_distinct,
            "CLEARANCE_DEDUP_COMPARE_ONLY_DISTINCT",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ClearanceError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if let Some(pattern) = self
            .scope
            .scope_patterns
            .iter()
            .chain(&self.scope.copyright_scope_patterns)
            .chain(&self.scope.ignore_patterns)
            .find(|p| p.trim().is_empty() || p.contains('/'))
        {
            return Err(ConfigError::InvalidValue {
                field: "scope".to_owned(),
                reason: format!("pattern '{pattern}' must be a non-empty file name pattern"),
            }
            .into());
        }

        if self.curation.enabled {
            if self.curation.rule_dir.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "curation.rule_dir".to_owned(),
                    reason: "rule_dir must not be empty when curation is enabled".to_owned(),
                }
                .into());
            }
            if self.curation.archive_dir.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "curation.archive_dir".to_owned(),
                    reason: "archive_dir must not be empty when curation is enabled".to_owned(),
                }
                .into());
            }
        }

        if self.curation.min_issue_level().is_none() {
            return Err(ConfigError::InvalidValue {
                field: "curation.issue_level".to_owned(),
                reason: "must be one of: info, warn, error".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 스코프 분류 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// DIR/DEFAULT 라이선스 스코프로 분류할 파일 이름 패턴
    pub scope_patterns: Vec<String>,
    /// DIR/DEFAULT 저작권 스코프로 분류할 파일 이름 패턴
    pub copyright_scope_patterns: Vec<String>,
    /// 항상 FILE 스코프로 분류할 파일 이름 패턴
    pub ignore_patterns: Vec<String>,
    /// 파일 이름을 소문자로 비교할지 여부
    pub lowercase: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            scope_patterns: vec![
                "LICENSE*".to_owned(),
                "LICENCE*".to_owned(),
                "COPYING*".to_owned(),
                "UNLICENSE".to_owned(),
                "NOTICE*".to_owned(),
            ],
            copyright_scope_patterns: vec![
                "NOTICE*".to_owned(),
                "AUTHORS*".to_owned(),
                "COPYRIGHT*".to_owned(),
            ],
            ignore_patterns: vec![
                "*.java".to_owned(),
                "*.c".to_owned(),
                "*.rs".to_owned(),
                "*.py".to_owned(),
                "*.js".to_owned(),
                "*.go".to_owned(),
            ],
            lowercase: true,
        }
    }
}

/// 큐레이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 큐레이션 규칙 디렉토리
    pub rule_dir: String,
    /// 규칙이 참조하는 라이선스 텍스트 저장소
    pub file_store: String,
    /// 아카이브 스테이징 디렉토리
    pub archive_dir: String,
    /// 출력에 남길 최소 이슈 레벨 (info, warn, error)
    pub issue_level: String,
}

impl CurationConfig {
    /// 최소 이슈 레벨을 파싱합니다.
    pub fn min_issue_level(&self) -> Option<IssueLevel> {
        IssueLevel::from_str_loose(&self.issue_level)
    }
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rule_dir: "curations".to_owned(),
            file_store: "curations/file-store".to_owned(),
            archive_dir: "archive".to_owned(),
            issue_level: "warn".to_owned(),
        }
    }
}

/// 중복 제거 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 중복이어도 파일 레벨 항목을 보존할지 여부
    pub preserve_file_scopes: bool,
    /// 비교 전 양쪽을 고유 항목으로 축약할지 여부
    pub compare_only_distinct: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            preserve_file_scopes: false,
            compare_only_distinct: true,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
