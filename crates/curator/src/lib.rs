#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 도메인 에러 타입 (`CuratorError`)
//! - [`config`]: 큐레이터 설정 (`CuratorConfig`, 빌더)
//! - [`scope`]: 스코프 분류 (`ScopeClassifier`, `FileScopeMatcher`)
//! - [`rule`]: 규칙 저장소 (`CurationRuleStore`, 로더, 검증, IVY 범위)
//! - [`archive`]: 라이선스 아카이브 (`LicenseArchive`, 일관성 검사)
//! - [`engine`]: 규칙 적용 (`CurationEngine`, `CurationReport`)
//! - [`consolidate`]: 집계 재계산과 중복 제거 (`ScopeConsolidator`)
//! - [`issues`]: 이슈 조정 (`IssueReconciler`)
//!
//! # Architecture
//!
//! ```text
//! rule_dir --> RuleLoader --> validate_rule --> CurationRuleStore
//!                                                     |
//! Project ---------------------------------> CurationEngine
//!                                              |    |    |
//!                              IssueReconciler-+    |    +-- LicenseArchive
//!                                                   |
//!                                          ScopeConsolidator
//!                                                   |
//!                                     Project (curated) --> check_consistency
//! ```

pub mod archive;
pub mod config;
pub mod consolidate;
pub mod engine;
pub mod error;
pub mod issues;
pub mod rule;
pub mod scope;

// --- Public API Re-exports ---

// Engine
pub use engine::{CurationEngine, CurationReport, wildcard_match};

// Configuration
pub use config::{CuratorConfig, CuratorConfigBuilder};

// Error
pub use error::CuratorError;

// Scope
pub use scope::{FileScopeMatcher, ScopeClassifier};

// Rules
pub use rule::{CurationRule, CurationRuleStore, IvyRange, RejectionReason, RuleRejection};

// Archive
pub use archive::{ArchiveError, Inconsistency, LicenseArchive};

// Consolidation / issues
pub use consolidate::{DedupStats, ScopeConsolidator};
pub use issues::{IssueReconciler, ReconcileReport};
