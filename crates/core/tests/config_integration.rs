//! clearance.toml 통합 설정 테스트
//!
//! - clearance.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use clearance_core::config::ClearanceConfig;
use clearance_core::error::{ClearanceError, ConfigError};
use clearance_core::types::IssueLevel;

const EXAMPLE: &str = include_str!("../../../clearance.toml.example");

// =============================================================================
// clearance.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = ClearanceConfig::parse(EXAMPLE).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
}

#[test]
fn example_config_passes_validation() {
    let config = ClearanceConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_has_correct_scope_patterns() {
    let config = ClearanceConfig::parse(EXAMPLE).expect("should parse");

    assert_eq!(
        config.scope.scope_patterns,
        vec!["LICENSE*", "LICENCE*", "COPYING*", "UNLICENSE", "NOTICE*"]
    );
    assert_eq!(
        config.scope.copyright_scope_patterns,
        vec!["NOTICE*", "AUTHORS*", "COPYRIGHT*"]
    );
    assert!(config.scope.ignore_patterns.contains(&"*.rs".to_owned()));
    assert!(config.scope.lowercase);
}

#[test]
fn example_config_matches_code_defaults() {
    let example = ClearanceConfig::parse(EXAMPLE).expect("should parse");
    let defaults = ClearanceConfig::default();

    assert_eq!(example.general.log_level, defaults.general.log_level);
    assert_eq!(example.general.log_format, defaults.general.log_format);
    assert_eq!(example.scope.scope_patterns, defaults.scope.scope_patterns);
    assert_eq!(
        example.scope.copyright_scope_patterns,
        defaults.scope.copyright_scope_patterns
    );
    assert_eq!(example.scope.ignore_patterns, defaults.scope.ignore_patterns);
    assert_eq!(example.scope.lowercase, defaults.scope.lowercase);
    assert_eq!(example.curation.enabled, defaults.curation.enabled);
    assert_eq!(example.curation.rule_dir, defaults.curation.rule_dir);
    assert_eq!(example.curation.file_store, defaults.curation.file_store);
    assert_eq!(example.curation.archive_dir, defaults.curation.archive_dir);
    assert_eq!(example.curation.issue_level, defaults.curation.issue_level);
    assert_eq!(example.dedup.enabled, defaults.dedup.enabled);
    assert_eq!(
        example.dedup.preserve_file_scopes,
        defaults.dedup.preserve_file_scopes
    );
    assert_eq!(
        example.dedup.compare_only_distinct,
        defaults.dedup.compare_only_distinct
    );
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_curation_only() {
    let toml = r#"
[curation]
rule_dir = "/srv/curations"
issue_level = "error"
"#;
    let config = ClearanceConfig::parse(toml).expect("should parse");

    assert_eq!(config.curation.rule_dir, "/srv/curations");
    assert_eq!(config.curation.min_issue_level(), Some(IssueLevel::Error));
    assert_eq!(config.curation.archive_dir, "archive");
    assert_eq!(config.general.log_level, "info");
    assert!(config.dedup.enabled);
}

#[test]
fn partial_config_two_sections() {
    let toml = r#"
[general]
log_format = "json"

[dedup]
enabled = false
"#;
    let config = ClearanceConfig::parse(toml).expect("should parse");

    assert_eq!(config.general.log_format, "json");
    assert!(!config.dedup.enabled);
    assert!(config.dedup.compare_only_distinct);
    config.validate().expect("should validate");
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[curation]
archive_dir = "from-toml"
"#;
    let original = std::env::var("CLEARANCE_CURATION_ARCHIVE_DIR").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("CLEARANCE_CURATION_ARCHIVE_DIR", "from-env");
    }

    let mut config = ClearanceConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.curation.archive_dir.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("CLEARANCE_CURATION_ARCHIVE_DIR", val),
            None => std::env::remove_var("CLEARANCE_CURATION_ARCHIVE_DIR"),
        }
    }

    assert_eq!(result, "from-env");
}

#[test]
#[serial_test::serial]
fn env_override_csv_for_scope_patterns() {
    let original = std::env::var("CLEARANCE_SCOPE_SCOPE_PATTERNS").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("CLEARANCE_SCOPE_SCOPE_PATTERNS", "LICENSE, NOTICE");
    }

    let mut config = ClearanceConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.scope.scope_patterns.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("CLEARANCE_SCOPE_SCOPE_PATTERNS", val),
            None => std::env::remove_var("CLEARANCE_SCOPE_SCOPE_PATTERNS"),
        }
    }

    assert_eq!(result, vec!["LICENSE", "NOTICE"]);
}

#[test]
#[serial_test::serial]
fn env_override_bool_field() {
    let original = std::env::var("CLEARANCE_DEDUP_PRESERVE_FILE_SCOPES").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("CLEARANCE_DEDUP_PRESERVE_FILE_SCOPES", "true");
    }

    let mut config = ClearanceConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.dedup.preserve_file_scopes;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("CLEARANCE_DEDUP_PRESERVE_FILE_SCOPES", val),
            None => std::env::remove_var("CLEARANCE_DEDUP_PRESERVE_FILE_SCOPES"),
        }
    }

    assert!(result);
}

#[test]
#[serial_test::serial]
fn env_override_missing_var_keeps_toml_value() {
    let toml = r#"
[general]
log_level = "warn"
"#;

    // SAFETY: 존재하지 않는 변수를 명시적으로 제거
    unsafe {
        std::env::remove_var("CLEARANCE_GENERAL_LOG_LEVEL");
    }

    let mut config = ClearanceConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();

    assert_eq!(config.general.log_level, "warn");
}

// =============================================================================
// 빈 파일 / 잘못된 형식 에러 테스트
// =============================================================================

#[test]
fn comments_only_parses_with_defaults() {
    let toml = "# nothing here\n# [scope]\n";
    let config = ClearanceConfig::parse(toml).expect("should parse");
    assert_eq!(config.curation.rule_dir, "curations");
}

#[test]
fn invalid_type_returns_parse_error() {
    let toml = r#"
[scope]
lowercase = "sometimes"
"#;
    let err = ClearanceConfig::parse(toml).expect_err("should fail");
    assert!(matches!(
        err,
        ClearanceError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn unknown_section_is_ignored() {
    let toml = r#"
[future_feature]
enabled = true

[dedup]
enabled = false
"#;
    let config = ClearanceConfig::parse(toml).expect("should parse");
    assert!(!config.dedup.enabled);
}

#[test]
fn from_file_nonexistent_returns_file_not_found() {
    let err = ClearanceConfig::from_file("/nonexistent/clearance.toml").expect_err("should fail");
    assert!(matches!(
        err,
        ClearanceError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[test]
#[serial_test::serial]
fn load_example_config_from_disk() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../clearance.toml.example");
    let config = ClearanceConfig::load(path).expect("example config should load");
    assert!(config.curation.enabled);
}

#[test]
fn example_config_serialize_roundtrip() {
    let config = ClearanceConfig::parse(EXAMPLE).expect("should parse");
    let serialized = toml::to_string_pretty(&config).expect("should serialize");
    let reparsed = ClearanceConfig::parse(&serialized).expect("should reparse");
    assert_eq!(config.scope.scope_patterns, reparsed.scope.scope_patterns);
    assert_eq!(config.curation.issue_level, reparsed.curation.issue_level);
}
