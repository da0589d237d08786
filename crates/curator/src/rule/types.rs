//! 큐레이션 규칙 데이터 구조
//!
//! YAML에서 읽은 원본 형태([`RawCurationPackage`])와 검증을 통과한 타입 형태
//! ([`CurationRule`])를 분리합니다. 수정자(modifier) 문자열은 검증 단계에서
//! [`PackageOp`], [`LicenseOp`], [`CopyrightOp`]로 변환되며 이후 코드는
//! 문자열을 다루지 않습니다.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use clearance_core::model::{DEFAULT_LICENSING_SCOPE, REUSE_LICENSES_FOLDER};
use clearance_core::types::PackageId;

use crate::scope::FileScopeMatcher;

use super::version::IvyRange;

/// 와일드카드 값 (`license`, `license_text_in_archive` 필드)
pub const WILDCARD: &str = "*";

// --- 원본 (YAML) 형태 ---

/// YAML 문서의 큐레이션 패키지 레코드
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCurationPackage {
    /// `type:namespace:name:version-range`
    pub id: String,
    /// insert | update | delete
    #[serde(default)]
    pub package_modifier: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// insert 규칙의 저장소 URL
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub resolved_issues: Option<Vec<String>>,
    #[serde(default)]
    pub curations: Option<RawCurations>,
}

impl RawCurationPackage {
    /// 파일 단위 큐레이션 항목 목록 (없으면 빈 슬라이스)
    pub fn file_items(&self) -> &[RawFileItem] {
        self.curations
            .as_ref()
            .map(|c| c.file_licenses.as_slice())
            .unwrap_or_default()
    }
}

/// 큐레이션 본문
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCurations {
    #[serde(default)]
    pub file_licenses: Vec<RawFileItem>,
}

/// 파일 스코프 단위 큐레이션 항목
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFileItem {
    #[serde(default)]
    pub file_scope: Option<String>,
    #[serde(default)]
    pub file_licenses: Vec<RawLicenseItem>,
    #[serde(default)]
    pub file_copyrights: Vec<RawCopyrightItem>,
}

/// 라이선스 하위 항목
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLicenseItem {
    pub modifier: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub license_text_in_archive: Option<String>,
}

/// 저작권 하위 항목
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCopyrightItem {
    pub modifier: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
}

// --- 수정자 ---

/// 패키지 수정자
///
/// `Ord` 순서가 1단계 적용 순서입니다 (`Insert < Delete`, `Update`는 2단계).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PackageOp {
    Insert,
    Delete,
    Update,
}

impl PackageOp {
    /// 이 패키지 수정자에서 허용되는 라이선스 수정자
    pub fn allowed_license_ops(&self) -> &'static [LicenseOp] {
        match self {
            Self::Insert => &[LicenseOp::Insert],
            Self::Update => &[LicenseOp::Delete, LicenseOp::Insert, LicenseOp::Update],
            Self::Delete => &[],
        }
    }

    /// 이 패키지 수정자에서 허용되는 저작권 수정자
    pub fn allowed_copyright_ops(&self) -> &'static [CopyrightOp] {
        match self {
            Self::Insert => &[CopyrightOp::Insert],
            Self::Update => &[CopyrightOp::DeleteAll, CopyrightOp::Delete, CopyrightOp::Insert],
            Self::Delete => &[],
        }
    }
}

/// 라이선스 수정자
///
/// `Ord` 순서가 update 규칙의 적용 순서입니다 (delete → insert → update).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LicenseOp {
    Delete,
    Insert,
    Update,
}

/// 저작권 수정자
///
/// `Ord` 순서가 update 규칙의 적용 순서입니다 (delete-all → delete → insert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CopyrightOp {
    DeleteAll,
    Delete,
    Insert,
}

/// 알 수 없는 수정자 문자열
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModifier(pub String);

impl fmt::Display for UnknownModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown modifier '{}'", self.0)
    }
}

impl FromStr for PackageOp {
    type Err = UnknownModifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(UnknownModifier(s.to_owned())),
        }
    }
}

impl FromStr for LicenseOp {
    type Err = UnknownModifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insert" => Ok(Self::Insert),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(UnknownModifier(s.to_owned())),
        }
    }
}

impl FromStr for CopyrightOp {
    type Err = UnknownModifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insert" => Ok(Self::Insert),
            "delete" => Ok(Self::Delete),
            "delete-all" | "delete_all" => Ok(Self::DeleteAll),
            _ => Err(UnknownModifier(s.to_owned())),
        }
    }
}

impl fmt::Display for PackageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl fmt::Display for LicenseOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl fmt::Display for CopyrightOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Delete => write!(f, "delete"),
            Self::DeleteAll => write!(f, "delete-all"),
        }
    }
}

// --- 검증된 형태 ---

/// 라이선스 텍스트 참조의 세 가지 상태
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LicenseTextRef {
    /// 텍스트 없음 (`null`)
    Absent,
    /// 파일 저장소 내 특정 경로
    Specific(String),
    /// 모든 값과 일치 (`"*"`)
    Any,
}

impl LicenseTextRef {
    /// YAML 필드 값에서 변환합니다.
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            None => Self::Absent,
            Some(WILDCARD) => Self::Any,
            Some(path) => Self::Specific(path.to_owned()),
        }
    }

    /// 모델의 아카이브 참조와 일치하는지 확인합니다.
    ///
    /// `Specific`은 아카이브 이름 그대로이거나 그 이름으로 끝나는 경로일 수 있습니다.
    pub fn matches(&self, archived: Option<&str>) -> bool {
        match (self, archived) {
            (Self::Any, _) => true,
            (Self::Absent, None) => true,
            (Self::Specific(path), Some(name)) => archive_name_matches(path, name),
            _ => false,
        }
    }
}

fn archive_name_matches(store_path: &str, archived: &str) -> bool {
    let file_name = store_path.rsplit(['/', '\\']).next().unwrap_or(store_path);
    archived == store_path || archived == file_name
}

/// 라이선스 값 매칭
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LicenseValue {
    /// 모든 라이선스 (`"*"`)
    Any,
    /// 특정 라이선스 식별자
    Exact(String),
}

impl LicenseValue {
    pub fn matches(&self, license: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == license,
        }
    }

    /// 특정 식별자 (와일드카드면 `None`)
    pub fn exact(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Exact(license) => Some(license),
        }
    }
}

/// 검증된 라이선스 큐레이션
#[derive(Debug, Clone)]
pub struct LicenseCuration {
    pub op: LicenseOp,
    pub license: LicenseValue,
    pub text: LicenseTextRef,
    pub reason: Option<String>,
    pub comment: Option<String>,
}

/// 검증된 저작권 큐레이션
#[derive(Debug, Clone)]
pub struct CopyrightCuration {
    pub op: CopyrightOp,
    /// insert: 저작권 문구 / delete: 와일드카드 패턴 / delete-all: `None`
    pub copyright: Option<String>,
    pub reason: Option<String>,
    pub comment: Option<String>,
}

/// 파일 스코프 단위 큐레이션 항목
#[derive(Debug, Clone)]
pub struct CurationFileItem {
    /// 패키지 루트 기준 파일 스코프 (글롭 가능)
    pub file_scope: String,
    pub matcher: FileScopeMatcher,
    pub licenses: Vec<LicenseCuration>,
    pub copyrights: Vec<CopyrightCuration>,
}

impl CurationFileItem {
    /// 패키지 기본 라이선스 대상인지 확인합니다.
    pub fn is_default_licensing(&self) -> bool {
        self.file_scope == DEFAULT_LICENSING_SCOPE
    }

    /// REUSE 라이선스 폴더 안의 스코프인지 확인합니다.
    pub fn is_in_licenses_folder(&self) -> bool {
        self.file_scope.starts_with(REUSE_LICENSES_FOLDER)
    }
}

/// 검증을 통과한 큐레이션 규칙
#[derive(Debug, Clone)]
pub struct CurationRule {
    /// 원본 규칙 ID
    pub id: String,
    /// `(type, namespace, name)` -- 버전은 비어있음
    pub coordinates: PackageId,
    /// 버전 범위
    pub range: IvyRange,
    pub op: PackageOp,
    pub comment: Option<String>,
    pub repository: Option<String>,
    pub resolved_issues: Vec<String>,
    pub items: Vec<CurationFileItem>,
    /// 규칙이 정의된 파일
    pub source: PathBuf,
}

impl CurationRule {
    /// 규칙이 패키지 식별자와 일치하는지 확인합니다.
    pub fn matches(&self, id: &PackageId) -> bool {
        self.coordinates.same_coordinates(id) && self.range.matches(&id.version)
    }

    /// REUSE 규약을 따르는 패키지를 대상으로 하는지 확인합니다.
    pub fn targets_reuse_package(&self) -> bool {
        self.items.iter().any(CurationFileItem::is_in_licenses_folder)
    }

    /// insert 규칙이 생성할 패키지 식별자
    ///
    /// 버전 범위가 정확한 버전일 때만 그 버전을, 아니면 빈 버전을 사용합니다.
    pub fn insert_target(&self) -> PackageId {
        let mut id = self.coordinates.clone();
        let raw = self.range.to_string();
        if !self.range.is_any() && !raw.contains(['[', ']', '(', ')', '+']) {
            id.version = raw.trim().to_owned();
        }
        id
    }

    /// 기본 라이선스 대상을 제외한 파일 스코프 항목
    pub fn file_items(&self) -> impl Iterator<Item = &CurationFileItem> {
        self.items.iter().filter(|i| !i.is_default_licensing())
    }

    /// 패키지 기본 라이선스 항목
    pub fn default_items(&self) -> impl Iterator<Item = &CurationFileItem> {
        self.items.iter().filter(|i| i.is_default_licensing())
    }
}
