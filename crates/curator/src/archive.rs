//! 라이선스 아카이브 -- 라이선스 텍스트/원본 파일 스테이징 디렉토리
//!
//! 모델의 `licenseTextInArchive` / `fileContentInArchive` 참조는 이 디렉토리 안의
//! 파일 이름입니다. 새 파일은 `(패키지 ID, 상대 경로, 라이선스)`를 평탄화한 이름으로
//! 저장됩니다.
//!
//! ```text
//! Maven:org.example:lib:1.0 + src/COPYING.txt + MIT
//!   -> Maven%org.example%lib%1.0%src%COPYING-MIT.txt
//! ```
//!
//! 같은 이름이 이미 있을 때 내용이 같으면 기존 이름을 재사용하고, 다르면
//! 확장자 앞에 `_2`, `_3`, ... 을 붙입니다. 이름 할당은 디렉토리의 현재 상태를
//! 읽은 뒤 쓰므로 동시에 호출하면 안 됩니다.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use clearance_core::model::{Pack, Project};
use clearance_core::types::PackageId;

use crate::error::CuratorError;

/// 아카이브 작업 에러
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// 복사할 원본 파일이 없음
    #[error("source file does not exist: {path}")]
    SourceMissing { path: String },

    /// 파일 I/O 실패
    #[error("archive io error: {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl ArchiveError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<ArchiveError> for CuratorError {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::SourceMissing { path } => CuratorError::Archive {
                path,
                reason: "source file does not exist".to_owned(),
            },
            ArchiveError::Io { path, source } => CuratorError::Io { path, source },
        }
    }
}

/// 모델과 아카이브 사이의 불일치
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// 모델이 참조하지만 아카이브에 없는 파일 (model -> archive)
    MissingFile { package: PackageId, name: String },
    /// 아카이브에 있지만 어떤 모델 항목도 참조하지 않는 파일 (archive -> model)
    Orphan { name: String },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile { package, name } => {
                write!(f, "model -> archive: '{name}' referenced by {package} is missing")
            }
            Self::Orphan { name } => {
                write!(f, "archive -> model: '{name}' is not referenced by any package")
            }
        }
    }
}

/// 라이선스 아카이브
#[derive(Debug, Clone)]
pub struct LicenseArchive {
    root: PathBuf,
}

impl LicenseArchive {
    /// 스테이징 디렉토리를 열고, 없으면 생성합니다.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| ArchiveError::io(&root, e))?;
        Ok(Self { root })
    }

    /// 스테이징 디렉토리 경로
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 아카이브 파일 경로
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// 아카이브에 파일이 있는지 확인합니다.
    pub fn contains(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    /// 원본 파일을 아카이브에 복사하고 할당된 이름을 반환합니다.
    ///
    /// # Errors
    /// - 원본이 없으면 [`ArchiveError::SourceMissing`]
    /// - 읽기/쓰기 실패 시 [`ArchiveError::Io`]
    pub fn add(
        &self,
        source: &Path,
        package: &PackageId,
        relative_path: &str,
        license: Option<&str>,
    ) -> Result<String, ArchiveError> {
        if !source.is_file() {
            return Err(ArchiveError::SourceMissing {
                path: source.display().to_string(),
            });
        }
        let content = std::fs::read(source).map_err(|e| ArchiveError::io(source, e))?;

        let base = flattened_name(package, relative_path, license);
        let (stem, ext) = split_extension(&base);

        let mut counter = 1usize;
        loop {
            let candidate = if counter == 1 {
                base.clone()
            } else {
                format!("{stem}_{counter}{ext}")
            };
            let target = self.path_of(&candidate);

            if !target.exists() {
                std::fs::write(&target, &content).map_err(|e| ArchiveError::io(&target, e))?;
                tracing::debug!(
                    name = %candidate,
                    source = %source.display(),
                    "archived file"
                );
                return Ok(candidate);
            }

            let existing = std::fs::read(&target).map_err(|e| ArchiveError::io(&target, e))?;
            if existing == content {
                return Ok(candidate);
            }
            counter += 1;
        }
    }

    /// 아카이브 파일을 삭제합니다. 없으면 아무것도 하지 않습니다.
    ///
    /// 실제로 삭제했으면 `true`를 반환합니다.
    pub fn remove(&self, name: &str) -> Result<bool, ArchiveError> {
        let target = self.path_of(name);
        match std::fs::remove_file(&target) {
            Ok(()) => {
                tracing::debug!(name, "removed archived file");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ArchiveError::io(&target, e)),
        }
    }

    /// 패키지가 더 이상 참조하지 않는 아카이브 파일을 삭제합니다.
    ///
    /// 참조 항목을 모델에서 제거한 뒤 호출해야 합니다. 삭제 실패는 경고만 남깁니다.
    pub fn release(&self, pack: &Pack, name: &str) -> bool {
        if pack.references_blob(name) {
            return false;
        }
        match self.remove(name) {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(package = %pack.id, name, error = %e, "failed to release archived file");
                false
            }
        }
    }

    /// 스테이징 디렉토리의 파일 이름 목록
    pub fn file_names(&self) -> Result<BTreeSet<String>, ArchiveError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| ArchiveError::io(&self.root, e))?;
        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| ArchiveError::io(&self.root, e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| ArchiveError::io(&entry.path(), e))?
                .is_file();
            if is_file {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    /// 모델과 아카이브의 양방향 일관성을 검사합니다.
    ///
    /// 상태를 변경하지 않습니다. 각 누락 참조와 고아 파일은 한 번씩만 보고됩니다.
    pub fn check_consistency(&self, project: &Project) -> Result<Vec<Inconsistency>, ArchiveError> {
        let files = self.file_names()?;

        let mut referenced: BTreeMap<&str, &PackageId> = BTreeMap::new();
        for pack in &project.packs {
            for name in pack.archive_references() {
                referenced.entry(name).or_insert(&pack.id);
            }
        }

        let mut issues: Vec<Inconsistency> = referenced
            .iter()
            .filter(|(name, _)| !files.contains(**name))
            .map(|(name, package)| Inconsistency::MissingFile {
                package: (*package).clone(),
                name: (*name).to_owned(),
            })
            .collect();

        issues.extend(
            files
                .iter()
                .filter(|name| !referenced.contains_key(name.as_str()))
                .map(|name| Inconsistency::Orphan { name: name.clone() }),
        );

        for issue in &issues {
            tracing::error!(%issue, "archive inconsistency");
        }

        Ok(issues)
    }
}

/// `(패키지 ID, 상대 경로, 라이선스)`를 아카이브 파일 이름으로 평탄화합니다.
pub fn flattened_name(package: &PackageId, relative_path: &str, license: Option<&str>) -> String {
    let mut segments: Vec<String> = package
        .to_string()
        .split(':')
        .map(sanitize)
        .collect();
    segments.extend(
        relative_path
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .map(sanitize),
    );
    let joined = segments.join("%");

    match license.map(sanitize).filter(|l| !l.is_empty()) {
        Some(license) => {
            let (stem, ext) = split_extension(&joined);
            format!("{stem}-{license}{ext}")
        }
        None => joined,
    }
}

fn sanitize(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// 마지막 `%` 구간의 확장자를 분리합니다 (`.`으로 시작하는 이름은 확장자 없음).
fn split_extension(name: &str) -> (&str, &str) {
    let last_segment_start = name.rfind('%').map_or(0, |i| i + 1);
    match name[last_segment_start..].rfind('.') {
        Some(dot) if dot > 0 => name.split_at(last_segment_start + dot),
        _ => (name, ""),
    }
}
