//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 패키지 식별자, 이슈, 스코프 레벨 등 모든 모듈이 공유하는 데이터 구조를 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// 패키지 관리자 메타데이터가 없는 패키지의 타입 이름
pub const UNMANAGED_TYPE: &str = "Unmanaged";

/// 패키지 식별자
///
/// `type:namespace:name:version` 형식의 문자열로 직렬화됩니다.
/// 버전은 비어있을 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId {
    /// 패키지 관리자 타입 (Maven, NPM, Cargo, Unmanaged 등)
    pub pkg_type: String,
    /// 네임스페이스 (Maven groupId, NPM scope 등)
    pub namespace: String,
    /// 패키지 이름
    pub name: String,
    /// 패키지 버전
    pub version: String,
}

impl PackageId {
    /// 구성 요소로 식별자를 생성합니다.
    pub fn new(
        pkg_type: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            pkg_type: pkg_type.into(),
            namespace: namespace.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// 버전을 제외한 `(type, namespace, name)`이 같은지 확인합니다.
    pub fn same_coordinates(&self, other: &PackageId) -> bool {
        self.pkg_type == other.pkg_type
            && self.namespace == other.namespace
            && self.name == other.name
    }

    /// 패키지 관리자가 없는 패키지인지 확인합니다.
    pub fn is_unmanaged(&self) -> bool {
        self.pkg_type == UNMANAGED_TYPE
    }
}

impl FromStr for PackageId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(4, ':').collect();
        if parts.len() != 4 {
            return Err(ModelError::InvalidPackageId {
                id: s.to_owned(),
                reason: "expected 'type:namespace:name:version'".to_owned(),
            });
        }
        Ok(Self::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

impl TryFrom<String> for PackageId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.pkg_type, self.namespace, self.name, self.version
        )
    }
}

/// 이슈 레벨
///
/// `Ord` 구현으로 레벨 비교가 가능합니다 (`Info < Warn < Error`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum IssueLevel {
    /// 정보성 이슈
    #[default]
    Info,
    /// 경고
    Warn,
    /// 에러
    Error,
}

impl IssueLevel {
    /// 이슈 ID 접두 문자 (`I`, `W`, `E`)
    pub fn letter(&self) -> char {
        match self {
            Self::Info => 'I',
            Self::Warn => 'W',
            Self::Error => 'E',
        }
    }

    /// 이슈 ID 접두 문자에서 레벨을 복원합니다.
    pub fn from_letter(c: char) -> Option<Self> {
        match c {
            'I' => Some(Self::Info),
            'W' => Some(Self::Warn),
            'E' => Some(Self::Error),
            _ => None,
        }
    }

    /// 문자열에서 레벨을 파싱합니다 (대소문자 구분 없음).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "i" => Some(Self::Info),
            "warn" | "warning" | "w" => Some(Self::Warn),
            "error" | "err" | "e" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "Info"),
            Self::Warn => write!(f, "Warn"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// 구조화된 이슈
///
/// `id`는 패키지별로 순차 부여되며 (`E01`, `W02`, ...) 큐레이션 규칙의
/// `resolved_issues`에서 참조하는 계약입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// 이슈 ID
    pub id: String,
    /// 레벨
    pub level: IssueLevel,
    /// 메시지
    pub message: String,
    /// 관련 패키지 (루트 이슈에서만 사용)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageId>,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(pkg) => write!(f, "[{}] {} ({})", self.id, self.message, pkg),
            None => write!(f, "[{}] {}", self.id, self.message),
        }
    }
}

/// 이슈 목록에서 다음 순차 ID를 계산합니다.
///
/// 같은 레벨의 기존 ID 중 가장 큰 번호 + 1을 사용합니다.
pub fn next_issue_id<'a>(existing: impl Iterator<Item = &'a Issue>, level: IssueLevel) -> String {
    let letter = level.letter();
    let max = existing
        .filter_map(|issue| issue.id.strip_prefix(letter))
        .filter_map(|num| num.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{letter}{:02}", max + 1)
}

/// 라이선스/저작권 발견 항목이 기록되는 스코프 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeLevel {
    /// 개별 파일
    File,
    /// 디렉토리
    Dir,
    /// 패키지 전체 (기본)
    Default,
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "FILE"),
            Self::Dir => write!(f, "DIR"),
            Self::Default => write!(f, "DEFAULT"),
        }
    }
}
