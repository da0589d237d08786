//! 스코프 분류 -- 파일 경로를 FILE / DIR / DEFAULT 레벨로 매핑
//!
//! 분류 기준은 디렉토리 깊이가 아니라 **파일 이름** 패턴입니다.
//!
//! 1. 파일 이름이 ignore 패턴과 일치하면 항상 `File`
//! 2. 파일 이름이 스코프 패턴과 일치하고 패키지 루트 바로 아래에 있으면 `Default`
//! 3. 파일 이름이 스코프 패턴과 일치하고 하위 디렉토리에 있으면 `Dir`
//! 4. 그 외에는 `File`
//!
//! 라이선스와 저작권은 서로 다른 패턴 집합을 사용합니다.

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use clearance_core::types::ScopeLevel;

use crate::config::CuratorConfig;
use crate::error::CuratorError;

/// 파일 스코프 문자열에서 글롭 메타문자로 취급하는 문자
const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// 스코프 분류기
///
/// 설정의 패턴을 한 번 컴파일해 두고 순수 함수처럼 사용합니다.
#[derive(Debug, Clone)]
pub struct ScopeClassifier {
    license_patterns: GlobSet,
    copyright_patterns: GlobSet,
    ignore_patterns: GlobSet,
    lowercase: bool,
}

impl ScopeClassifier {
    /// 설정의 패턴으로 분류기를 생성합니다.
    pub fn new(config: &CuratorConfig) -> Result<Self, CuratorError> {
        Ok(Self {
            license_patterns: build_set(&config.scope_patterns, config.lowercase)?,
            copyright_patterns: build_set(&config.copyright_scope_patterns, config.lowercase)?,
            ignore_patterns: build_set(&config.ignore_patterns, config.lowercase)?,
            lowercase: config.lowercase,
        })
    }

    /// 패키지 루트 기준 경로의 라이선스 스코프를 분류합니다.
    pub fn classify(&self, path: &str) -> ScopeLevel {
        self.classify_with(&self.license_patterns, path)
    }

    /// 패키지 루트 기준 경로의 저작권 스코프를 분류합니다.
    pub fn classify_copyright(&self, path: &str) -> ScopeLevel {
        self.classify_with(&self.copyright_patterns, path)
    }

    /// 저장소 기준 경로를 `package_root`에 상대적으로 분류합니다.
    ///
    /// 경로가 `package_root` 밖에 있으면 경로 전체를 기준으로 분류합니다.
    pub fn classify_in(&self, repo_path: &str, package_root: &str) -> ScopeLevel {
        self.classify(strip_root(repo_path, package_root))
    }

    fn classify_with(&self, patterns: &GlobSet, path: &str) -> ScopeLevel {
        let path = path.trim_start_matches("./").trim_start_matches('/');
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let file_name = if self.lowercase {
            file_name.to_lowercase()
        } else {
            file_name.to_owned()
        };

        if self.ignore_patterns.is_match(&file_name) || !patterns.is_match(&file_name) {
            return ScopeLevel::File;
        }

        if path.contains('/') {
            ScopeLevel::Dir
        } else {
            ScopeLevel::Default
        }
    }
}

fn build_set(patterns: &[String], lowercase: bool) -> Result<GlobSet, CuratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = if lowercase {
            pattern.to_lowercase()
        } else {
            pattern.clone()
        };
        builder.add(GlobBuilder::new(&pattern).literal_separator(true).build()?);
    }
    Ok(builder.build()?)
}

fn strip_root<'a>(repo_path: &'a str, package_root: &str) -> &'a str {
    let root = package_root.trim_end_matches('/');
    if root.is_empty() {
        return repo_path;
    }
    match repo_path.strip_prefix(root) {
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => repo_path,
    }
}

/// 파일 스코프 문자열에 글롭 메타문자가 있는지 확인합니다.
pub fn has_glob_meta(scope: &str) -> bool {
    scope.contains(GLOB_META)
}

/// 큐레이션 규칙의 파일 스코프 매처
///
/// `*`는 디렉토리 경계를 넘지 않고 `**`는 넘습니다.
/// 메타문자가 없는 스코프는 정확히 같은 경로만 일치합니다.
#[derive(Debug, Clone)]
pub struct FileScopeMatcher {
    pattern: String,
    glob: Option<GlobMatcher>,
}

impl FileScopeMatcher {
    /// 패턴을 컴파일합니다.
    pub fn new(pattern: &str) -> Result<Self, CuratorError> {
        let glob = if has_glob_meta(pattern) {
            Some(
                GlobBuilder::new(pattern)
                    .literal_separator(true)
                    .build()?
                    .compile_matcher(),
            )
        } else {
            None
        };
        Ok(Self {
            pattern: pattern.to_owned(),
            glob,
        })
    }

    /// 원본 패턴 문자열
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// 패키지 루트 기준 경로가 패턴과 일치하는지 확인합니다.
    pub fn is_match(&self, path: &str) -> bool {
        match &self.glob {
            Some(glob) => glob.is_match(path),
            None => self.pattern == path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CuratorConfigBuilder;

    fn classifier(patterns: &[&str], lowercase: bool) -> ScopeClassifier {
        let config = CuratorConfigBuilder::new()
            .scope_patterns(patterns.iter().map(|s| s.to_string()).collect())
            .copyright_scope_patterns(vec!["AUTHORS".to_owned()])
            .ignore_patterns(vec!["*.java".to_owned()])
            .lowercase(lowercase)
            .build()
            .unwrap();
        ScopeClassifier::new(&config).unwrap()
    }

    #[test]
    fn license_at_root_is_default() {
        let c = classifier(&["LICENSE", "NOTICE"], false);
        assert_eq!(c.classify("LICENSE"), ScopeLevel::Default);
    }

    #[test]
    fn license_in_subdir_is_dir() {
        let c = classifier(&["LICENSE", "NOTICE"], false);
        assert_eq!(c.classify("sub/LICENSE"), ScopeLevel::Dir);
        assert_eq!(c.classify("a/b/NOTICE"), ScopeLevel::Dir);
    }

    #[test]
    fn unmatched_file_is_file() {
        let c = classifier(&["LICENSE", "NOTICE"], false);
        assert_eq!(c.classify("sub/readme.txt"), ScopeLevel::File);
    }

    #[test]
    fn ignore_pattern_wins_over_scope_pattern() {
        let c = classifier(&["*"], false);
        assert_eq!(c.classify("src/Main.java"), ScopeLevel::File);
        assert_eq!(c.classify("src/LICENSE"), ScopeLevel::Dir);
    }

    #[test]
    fn lowercase_comparison_is_configurable() {
        let insensitive = classifier(&["LICENSE*"], true);
        assert_eq!(insensitive.classify("license.txt"), ScopeLevel::Default);
        assert_eq!(insensitive.classify("License.md"), ScopeLevel::Default);

        let sensitive = classifier(&["LICENSE*"], false);
        assert_eq!(sensitive.classify("license.txt"), ScopeLevel::File);
    }

    #[test]
    fn pattern_matches_file_name_not_directory_name() {
        let c = classifier(&["LICENSE"], false);
        assert_eq!(c.classify("LICENSE/readme.txt"), ScopeLevel::File);
    }

    #[test]
    fn copyright_uses_its_own_patterns() {
        let c = classifier(&["LICENSE"], false);
        assert_eq!(c.classify_copyright("AUTHORS"), ScopeLevel::Default);
        assert_eq!(c.classify_copyright("lib/AUTHORS"), ScopeLevel::Dir);
        assert_eq!(c.classify_copyright("LICENSE"), ScopeLevel::File);
    }

    #[test]
    fn classify_in_strips_package_root() {
        let c = classifier(&["LICENSE"], false);
        assert_eq!(c.classify_in("modules/core/LICENSE", "modules/core"), ScopeLevel::Default);
        assert_eq!(
            c.classify_in("modules/core/sub/LICENSE", "modules/core/"),
            ScopeLevel::Dir
        );
        assert_eq!(c.classify_in("other/LICENSE", "modules/core"), ScopeLevel::Dir);
    }

    #[test]
    fn glob_meta_detection() {
        assert!(has_glob_meta("src/**/*.java"));
        assert!(has_glob_meta("file?.txt"));
        assert!(has_glob_meta("{a,b}.c"));
        assert!(!has_glob_meta("src/Main.java"));
    }

    #[test]
    fn file_scope_matcher_literal_and_glob() {
        let literal = FileScopeMatcher::new("src/Main.java").unwrap();
        assert!(literal.is_match("src/Main.java"));
        assert!(!literal.is_match("src/Other.java"));

        let single = FileScopeMatcher::new("src/*.java").unwrap();
        assert!(single.is_match("src/Main.java"));
        assert!(!single.is_match("src/deep/Main.java"));

        let deep = FileScopeMatcher::new("src/**/*.java").unwrap();
        assert!(deep.is_match("src/deep/Main.java"));
        assert!(deep.is_match("src/Main.java"));
    }

    #[test]
    fn invalid_pattern_is_error() {
        assert!(FileScopeMatcher::new("src/[abc").is_err());
    }
}
