//! 큐레이터 에러 타입
//!
//! [`CuratorError`]는 큐레이터 크레이트에서 발생할 수 있는 에러를 나타냅니다.
//! `From<CuratorError> for ClearanceError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **규칙 로딩**: `RuleLoad`, `RuleValidation`, `AmbiguousRule`
//! - **버전 범위**: `VersionRange`
//! - **아카이브**: `Archive`
//! - **패턴**: `Glob`
//! - **설정**: `Config`
//! - **파일 I/O**: `Io`

use clearance_core::error::{ClearanceError, ConfigError};

/// 큐레이터 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CuratorError {
    /// 규칙 파일을 읽거나 역직렬화할 수 없음 (치명적)
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 규칙 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 규칙 의미 검증 실패
    #[error("rule validation error: {rule_id}: {reason}")]
    RuleValidation {
        /// 규칙 ID
        rule_id: String,
        /// 거부 사유
        reason: String,
    },

    /// 하나의 패키지에 둘 이상의 규칙이 일치
    #[error("ambiguous rules for {package}: {}", rules.join(", "))]
    AmbiguousRule {
        /// 패키지 식별자
        package: String,
        /// 일치한 규칙 ID 목록
        rules: Vec<String>,
    },

    /// 아카이브 작업 실패
    #[error("archive error: {path}: {reason}")]
    Archive {
        /// 관련 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// IVY 버전 범위 파싱 실패
    #[error("version range error: '{range}': {reason}")]
    VersionRange {
        /// 범위 문자열
        range: String,
        /// 실패 사유
        reason: String,
    },

    /// 글롭 패턴 컴파일 실패
    #[error("glob error: {0}")]
    Glob(#[from] globset::Error),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl From<CuratorError> for ClearanceError {
    fn from(err: CuratorError) -> Self {
        match err {
            CuratorError::Config { field, reason } => {
                ClearanceError::Config(ConfigError::InvalidValue { field, reason })
            }
            CuratorError::Io { source, .. } => ClearanceError::Io(source),
            other => ClearanceError::Curation(other.to_string()),
        }
    }
}
