//! 패키지 라이선스 모델 -- 스캐너 결과를 큐레이션하기 위한 계층 구조
//!
//! [`Project`]는 여러 [`Pack`]을 보유하며, 각 패키지는 세 단계의 스코프에
//! 라이선스/저작권 발견 항목을 기록합니다.
//!
//! ```text
//! Pack
//!  ├── default_licensings / default_copyrights   (DEFAULT 스코프)
//!  ├── dir_licensings: dir path  -> DirLicensing  (DIR 스코프, 파생 상태)
//!  └── file_licensings: file path -> FileLicensing (FILE 스코프, 원천 데이터)
//! ```
//!
//! DIR/DEFAULT 집계는 FILE 데이터에서 재계산되는 파생 상태입니다.
//! 단, `declared = true`인 [`DefaultLicense`]는 패키지 관리자 메타데이터에서
//! 온 항목이므로 재계산 시에도 보존됩니다.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::{Issue, IssueLevel, PackageId, next_issue_id};

/// 파일이 아닌 패키지 기본 라이선스를 가리키는 큐레이션 file_scope 값
pub const DEFAULT_LICENSING_SCOPE: &str = "<DEFAULT_LICENSING>";

/// 라이선스를 확정할 수 없는 발견 항목의 표식
pub const UNRESOLVED_LICENSE: &str = "NOASSERTION";

/// REUSE 규약의 라이선스 텍스트 폴더
pub const REUSE_LICENSES_FOLDER: &str = "LICENSES/";

/// 큐레이션 대상 프로젝트 -- 스캔된 패키지 모델 전체
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// 패키지 목록
    #[serde(default)]
    pub packs: Vec<Pack>,
    /// 루트 이슈 목록 (특정 패키지에 귀속되지 않거나 패키지가 아직 없는 이슈)
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl Project {
    /// JSON 문자열에서 모델을 파싱합니다.
    pub fn from_json(json: &str, source: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::ParseFailed {
            path: source.to_owned(),
            reason: e.to_string(),
        })
    }

    /// 파일에서 모델을 로드합니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, crate::error::ClearanceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content, &path.display().to_string())?)
    }

    /// 모델을 들여쓰기된 JSON으로 직렬화합니다.
    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        serde_json::to_string_pretty(self).map_err(|e| ModelError::Serialize(e.to_string()))
    }

    /// 식별자로 패키지를 검색합니다.
    pub fn find_pack(&self, id: &PackageId) -> Option<&Pack> {
        self.packs.iter().find(|p| &p.id == id)
    }

    /// 식별자로 패키지를 검색합니다 (가변).
    pub fn find_pack_mut(&mut self, id: &PackageId) -> Option<&mut Pack> {
        self.packs.iter_mut().find(|p| &p.id == id)
    }

    /// 패키지를 제거하고 반환합니다.
    pub fn remove_pack(&mut self, id: &PackageId) -> Option<Pack> {
        let idx = self.packs.iter().position(|p| &p.id == id)?;
        Some(self.packs.remove(idx))
    }

    /// 루트 이슈를 기록하고 부여된 ID를 반환합니다.
    pub fn record_issue(
        &mut self,
        level: IssueLevel,
        message: impl Into<String>,
        package: Option<PackageId>,
    ) -> String {
        let id = next_issue_id(self.issues.iter(), level);
        self.issues.push(Issue {
            id: id.clone(),
            level,
            message: message.into(),
            package,
        });
        id
    }

    /// 특정 패키지에 대해 기록된 루트 이슈를 제거하고 제거된 수를 반환합니다.
    pub fn clear_root_issues_for(&mut self, id: &PackageId) -> usize {
        let before = self.issues.len();
        self.issues.retain(|issue| issue.package.as_ref() != Some(id));
        before - self.issues.len()
    }

    /// 최소 레벨 미만의 이슈를 모든 위치에서 제거합니다.
    pub fn retain_issues(&mut self, min_level: IssueLevel) {
        self.issues.retain(|i| i.level >= min_level);
        for pack in &mut self.packs {
            pack.retain_issues(min_level);
        }
    }
}

/// 패키지 -- `(type, namespace, name, version)`으로 식별됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pack {
    /// 패키지 식별자
    pub id: PackageId,
    /// 소스 저장소 URL (insert 규칙으로 생성된 경우 필수)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// 저장소 내 패키지 루트 디렉토리 (비어있으면 저장소 루트)
    #[serde(default)]
    pub package_root: String,
    /// REUSE 규약 준수 여부
    #[serde(default)]
    pub reuse_compliant: bool,
    /// 패키지 기본 라이선스
    #[serde(default)]
    pub default_licensings: Vec<DefaultLicense>,
    /// 패키지 기본 저작권
    #[serde(default)]
    pub default_copyrights: Vec<DefaultCopyright>,
    /// 디렉토리 경로 -> 디렉토리 집계
    #[serde(default)]
    pub dir_licensings: BTreeMap<String, DirLicensing>,
    /// 파일 경로 -> 파일 라이선스 정보
    #[serde(default)]
    pub file_licensings: BTreeMap<String, FileLicensing>,
    /// 패키지 이슈 목록
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl Pack {
    /// 빈 패키지를 생성합니다.
    pub fn new(id: PackageId) -> Self {
        Self {
            id,
            repository: None,
            package_root: String::new(),
            reuse_compliant: false,
            default_licensings: Vec::new(),
            default_copyrights: Vec::new(),
            dir_licensings: BTreeMap::new(),
            file_licensings: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    /// 패키지 이슈를 기록하고 부여된 ID를 반환합니다.
    ///
    /// ID는 패키지 내 모든 이슈 목록(패키지, 기본 라이선스, 디렉토리)을 기준으로
    /// 레벨별 순차 번호가 부여됩니다.
    pub fn record_issue(&mut self, level: IssueLevel, message: impl Into<String>) -> String {
        let id = next_issue_id(self.all_issues(), level);
        self.issues.push(Issue {
            id: id.clone(),
            level,
            message: message.into(),
            package: None,
        });
        id
    }

    /// 패키지에 속한 모든 이슈를 순회합니다.
    pub fn all_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .chain(self.default_licensings.iter().flat_map(|d| d.issues.iter()))
            .chain(self.dir_licensings.values().flat_map(|d| d.issues.iter()))
    }

    /// 최소 레벨 미만의 이슈를 제거합니다.
    pub fn retain_issues(&mut self, min_level: IssueLevel) {
        self.issues.retain(|i| i.level >= min_level);
        for default in &mut self.default_licensings {
            default.issues.retain(|i| i.level >= min_level);
        }
        for dir in self.dir_licensings.values_mut() {
            dir.issues.retain(|i| i.level >= min_level);
        }
    }

    /// 주어진 ID 집합에 속한 이슈를 모든 위치에서 제거하고 제거된 수를 반환합니다.
    pub fn remove_issues(&mut self, ids: &BTreeSet<String>) -> usize {
        let mut removed = 0;
        let mut retain = |list: &mut Vec<Issue>| {
            let before = list.len();
            list.retain(|i| !ids.contains(&i.id));
            removed += before - list.len();
        };
        retain(&mut self.issues);
        for default in &mut self.default_licensings {
            retain(&mut default.issues);
        }
        for dir in self.dir_licensings.values_mut() {
            retain(&mut dir.issues);
        }
        removed
    }

    /// 저장소 기준 경로를 패키지 루트 기준 경로로 변환합니다.
    ///
    /// 경로가 `package_root`로 시작하지 않으면 그대로 반환합니다.
    pub fn relative_scope(&self, repo_path: &str) -> String {
        let root = self.package_root.trim_end_matches('/');
        if root.is_empty() {
            return repo_path.to_owned();
        }
        match repo_path.strip_prefix(root) {
            Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_owned(),
            _ => repo_path.to_owned(),
        }
    }

    /// 패키지 모델이 참조하는 모든 아카이브 파일 이름을 반환합니다.
    pub fn archive_references(&self) -> BTreeSet<&str> {
        let mut refs = BTreeSet::new();
        for file in self.file_licensings.values() {
            if let Some(content) = file.file_content_in_archive.as_deref() {
                refs.insert(content);
            }
            for license in &file.licenses {
                if let Some(text) = license.license_text_in_archive.as_deref() {
                    refs.insert(text);
                }
            }
        }
        for dir in self.dir_licensings.values() {
            for license in &dir.licenses {
                if let Some(text) = license.license_text_in_archive.as_deref() {
                    refs.insert(text);
                }
            }
        }
        for default in &self.default_licensings {
            if let Some(text) = default.license_text_in_archive.as_deref() {
                refs.insert(text);
            }
        }
        refs
    }

    /// 아카이브 파일이 패키지 내 어디에서든 참조되는지 확인합니다.
    pub fn references_blob(&self, name: &str) -> bool {
        self.archive_references().contains(name)
    }

    /// REUSE 라이선스 폴더 안의 스코프인지 확인합니다.
    pub fn is_in_licenses_folder(scope: &str) -> bool {
        scope.starts_with(REUSE_LICENSES_FOLDER)
    }
}

/// 파일 단위 라이선스 정보
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLicensing {
    /// 패키지 루트 기준 파일 경로
    pub scope: String,
    /// 아카이브된 원본 파일 (있을 경우)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content_in_archive: Option<String>,
    /// 파일 라이선스 목록
    #[serde(default)]
    pub licenses: Vec<FileLicense>,
    /// 파일 저작권 목록
    #[serde(default)]
    pub copyrights: Vec<FileCopyright>,
}

impl FileLicensing {
    /// 빈 파일 라이선스 정보를 생성합니다.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            ..Self::default()
        }
    }

    /// 라이선스와 저작권이 모두 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty() && self.copyrights.is_empty()
    }

    /// 파일이 속한 디렉토리 경로 (루트이면 빈 문자열)
    pub fn dir(&self) -> &str {
        parent_dir(&self.scope)
    }
}

/// 파일 라이선스 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLicense {
    /// 라이선스 식별자 (SPDX)
    pub license: String,
    /// 아카이브된 라이선스 텍스트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_text_in_archive: Option<String>,
    /// 같은 파일 내 여러 발견 항목을 구분하는 시작 줄
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
}

impl FileLicense {
    /// 라이선스 항목을 생성합니다.
    pub fn new(license: impl Into<String>, license_text_in_archive: Option<String>) -> Self {
        Self {
            license: license.into(),
            license_text_in_archive,
            start_line: None,
        }
    }
}

/// 파일 저작권 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCopyright {
    /// 저작권 문구
    pub copyright: String,
}

impl FileCopyright {
    pub fn new(copyright: impl Into<String>) -> Self {
        Self {
            copyright: copyright.into(),
        }
    }
}

/// 디렉토리 단위 집계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirLicensing {
    /// 패키지 루트 기준 디렉토리 경로
    pub scope: String,
    /// 디렉토리 라이선스 목록
    #[serde(default)]
    pub licenses: Vec<DirLicense>,
    /// 디렉토리 저작권 목록
    #[serde(default)]
    pub copyrights: Vec<DirCopyright>,
    /// 디렉토리 이슈 목록
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl DirLicensing {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            ..Self::default()
        }
    }

    /// 라이선스와 저작권이 모두 비어있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty() && self.copyrights.is_empty()
    }
}

/// 디렉토리 라이선스 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirLicense {
    /// 라이선스 식별자
    pub license: String,
    /// 아카이브된 라이선스 텍스트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_text_in_archive: Option<String>,
    /// 항목이 유래한 파일 경로
    pub path: String,
}

/// 디렉토리 저작권 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirCopyright {
    /// 저작권 문구
    pub copyright: String,
    /// 항목이 유래한 파일 경로
    pub path: String,
}

/// 패키지 기본 라이선스 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultLicense {
    /// 라이선스 식별자
    pub license: String,
    /// 아카이브된 라이선스 텍스트
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_text_in_archive: Option<String>,
    /// 항목이 유래한 파일 경로 (declared 항목은 [`DEFAULT_LICENSING_SCOPE`])
    pub path: String,
    /// 패키지 관리자 메타데이터에서 선언된 항목 여부
    #[serde(default)]
    pub declared: bool,
    /// 항목 이슈 목록
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl DefaultLicense {
    /// 선언된 기본 라이선스 항목을 생성합니다.
    pub fn declared(license: impl Into<String>, license_text_in_archive: Option<String>) -> Self {
        Self {
            license: license.into(),
            license_text_in_archive,
            path: DEFAULT_LICENSING_SCOPE.to_owned(),
            declared: true,
            issues: Vec::new(),
        }
    }
}

/// 패키지 기본 저작권 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultCopyright {
    /// 저작권 문구
    pub copyright: String,
    /// 항목이 유래한 파일 경로
    pub path: String,
}

/// 경로의 상위 디렉토리 (루트 파일이면 빈 문자열)
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// `ancestor`가 `dir`과 같거나 그 상위 디렉토리인지 확인합니다.
pub fn is_same_or_ancestor_dir(ancestor: &str, dir: &str) -> bool {
    if ancestor.is_empty() || ancestor == dir {
        return true;
    }
    dir.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}
