//! 규칙 의미 검증
//!
//! [`RawCurationPackage`]를 [`CurationRule`]로 변환하면서 모든 검사를 수행합니다.
//! 하나라도 실패하면 규칙 전체가 거부되며, 거부 사유는 [`RejectionReason`]의
//! 한 변형으로 표현됩니다.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use clearance_core::model::REUSE_LICENSES_FOLDER;
use clearance_core::types::{PackageId, UNMANAGED_TYPE};

use crate::scope::{FileScopeMatcher, has_glob_meta};

use super::types::{
    CopyrightCuration, CopyrightOp, CurationFileItem, CurationRule, LicenseCuration, LicenseOp,
    LicenseTextRef, LicenseValue, PackageOp, RawCopyrightItem, RawCurationPackage, RawFileItem,
    RawLicenseItem, WILDCARD,
};
use super::version::IvyRange;

/// resolved_issues 항목 형식
static ISSUE_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[EWI]\d\d$").ok());

fn is_issue_id(id: &str) -> bool {
    id == "E*" || id == "W*" || ISSUE_ID.as_ref().is_some_and(|re| re.is_match(id))
}

/// 거부된 규칙
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRejection {
    /// 규칙 ID (원본 문자열)
    pub rule_id: String,
    /// 규칙이 정의된 파일
    pub source: String,
    /// 거부 사유
    pub reason: RejectionReason,
}

impl fmt::Display for RuleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.rule_id, self.source, self.reason)
    }
}

/// 규칙 거부 사유
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    /// 패키지 식별자 형식 오류
    #[error("malformed package id: {0}")]
    InvalidPackageId(String),

    /// 버전 범위 파싱 실패
    #[error("invalid version range: {0}")]
    InvalidVersionRange(String),

    /// 패키지 수정자 누락 또는 알 수 없음
    #[error("package_modifier must be one of insert, update, delete (got {0:?})")]
    InvalidPackageModifier(Option<String>),

    /// delete 규칙에 큐레이션 항목 존재
    #[error("delete rules must not carry curation items")]
    DeleteWithCurations,

    /// insert 규칙에 저장소 URL 누락
    #[error("insert rules require a repository")]
    MissingRepository,

    /// 하위 항목 수정자가 허용되지 않음
    #[error("modifier '{modifier}' is not allowed in {package_modifier} rules ({scope})")]
    ModifierNotAllowed {
        modifier: String,
        package_modifier: PackageOp,
        scope: String,
    },

    /// 파일 스코프 누락
    #[error("file_scope must not be empty")]
    EmptyFileScope,

    /// 글롭 패턴 사용 불가 (insert 하위 항목 존재)
    #[error("file_scope '{0}' contains glob syntax but has insert items")]
    GlobNotAllowed(String),

    /// 글롭 패턴 컴파일 실패
    #[error("file_scope '{scope}' is not a valid glob: {reason}")]
    InvalidGlob { scope: String, reason: String },

    /// 라이선스 값 누락
    #[error("license must not be null ({0})")]
    NullLicense(String),

    /// insert에서 와일드카드 사용
    #[error("insert must not use '*' for license or license_text_in_archive ({0})")]
    WildcardInsert(String),

    /// 라이선스 텍스트 경로가 파일 저장소 밖을 가리킴
    #[error("license text '{0}' must be a relative path inside the file store")]
    LicenseTextOutsideStore(String),

    /// 참조된 라이선스 텍스트가 파일 저장소에 없음
    #[error("license text '{0}' does not exist in the file store")]
    MissingLicenseText(String),

    /// 저작권 insert에 빈 문구
    #[error("copyright insert requires a non-empty copyright ({0})")]
    EmptyCopyright(String),

    /// 저작권 delete 패턴 오류
    #[error("copyright delete requires a non-empty pattern without '**' ({0})")]
    InvalidCopyrightPattern(String),

    /// delete-all에 저작권 값 존재
    #[error("copyright delete-all must not specify a copyright ({0})")]
    DeleteAllWithCopyright(String),

    /// REUSE: LICENSES 폴더 파일에 둘 이상의 라이선스
    #[error("REUSE: at most one license per file in LICENSES/ ({0})")]
    ReuseMultipleLicenses(String),

    /// REUSE: LICENSES 폴더 항목에 텍스트 누락
    #[error("REUSE: license_text_in_archive required inside LICENSES/ ({0})")]
    ReuseTextRequired(String),

    /// REUSE: LICENSES 폴더 밖 항목에 텍스트 존재
    #[error("REUSE: license_text_in_archive must be null outside LICENSES/ ({0})")]
    ReuseTextForbidden(String),

    /// insert/delete 규칙에 resolved_issues 존재
    #[error("resolved_issues are only allowed in update rules")]
    ResolvedIssuesNotAllowed,

    /// resolved_issues 항목 형식 오류
    #[error("resolved issue '{0}' must look like E01, W12, I03, E* or W*")]
    InvalidIssueId(String),
}

/// 원본 규칙을 검증하고 타입 형태로 변환합니다.
///
/// `file_store`는 insert/update 항목이 참조하는 라이선스 텍스트가 실제로
/// 존재하는지 확인하는 데 사용됩니다.
pub fn validate_rule(
    raw: &RawCurationPackage,
    file_store: &Path,
    source: &Path,
) -> Result<CurationRule, RuleRejection> {
    let reject = |reason: RejectionReason| RuleRejection {
        rule_id: raw.id.clone(),
        source: source.display().to_string(),
        reason,
    };

    // 1. 패키지 식별자
    let (coordinates, range) = parse_rule_id(&raw.id).map_err(reject)?;

    // 2. 패키지 수정자
    let op: PackageOp = raw
        .package_modifier
        .as_deref()
        .and_then(|m| m.parse().ok())
        .ok_or_else(|| reject(RejectionReason::InvalidPackageModifier(raw.package_modifier.clone())))?;

    // 3. delete 규칙은 큐레이션 항목 없음
    if op == PackageOp::Delete && !raw.file_items().is_empty() {
        return Err(reject(RejectionReason::DeleteWithCurations));
    }

    // 4. insert 규칙은 저장소 필수
    if op == PackageOp::Insert && raw.repository.as_deref().is_none_or(|r| r.trim().is_empty()) {
        return Err(reject(RejectionReason::MissingRepository));
    }

    // 11. resolved_issues
    let resolved_issues = raw.resolved_issues.clone().unwrap_or_default();
    match op {
        PackageOp::Insert | PackageOp::Delete if !resolved_issues.is_empty() => {
            return Err(reject(RejectionReason::ResolvedIssuesNotAllowed));
        }
        _ => {}
    }
    if let Some(bad) = resolved_issues
        .iter()
        .find(|id| !is_issue_id(id))
    {
        return Err(reject(RejectionReason::InvalidIssueId(bad.clone())));
    }

    // 10. REUSE 패키지 판별 (insert 대상)
    let reuse = op == PackageOp::Insert
        && raw.file_items().iter().any(|item| {
            item.file_scope
                .as_deref()
                .is_some_and(|s| s.starts_with(REUSE_LICENSES_FOLDER))
        });

    if reuse {
        check_reuse_license_count(raw.file_items()).map_err(reject)?;
    }

    let items = raw
        .file_items()
        .iter()
        .map(|item| validate_item(item, op, reuse, file_store))
        .collect::<Result<Vec<_>, _>>()
        .map_err(reject)?;

    Ok(CurationRule {
        id: raw.id.clone(),
        coordinates,
        range,
        op,
        comment: raw.comment.clone(),
        repository: raw.repository.clone(),
        resolved_issues,
        items,
        source: source.to_path_buf(),
    })
}

/// LICENSES 폴더의 파일마다 라이선스는 규칙 전체에서 하나까지
fn check_reuse_license_count(items: &[RawFileItem]) -> Result<(), RejectionReason> {
    let mut per_scope: BTreeMap<&str, usize> = BTreeMap::new();
    for item in items {
        let Some(scope) = item.file_scope.as_deref().map(str::trim) else {
            continue;
        };
        if !scope.starts_with(REUSE_LICENSES_FOLDER) {
            continue;
        }
        let count = per_scope.entry(scope).or_default();
        *count += item.file_licenses.len();
        if *count > 1 {
            return Err(RejectionReason::ReuseMultipleLicenses(scope.to_owned()));
        }
    }
    Ok(())
}

/// 파일 저장소 기준 상대 경로이며 상위 디렉토리로 벗어나지 않는지 확인합니다.
fn is_inside_store(path: &str) -> bool {
    let mut components = Path::new(path).components().peekable();
    components.peek().is_some()
        && components.all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// 규칙 ID를 `(type, namespace, name)` 좌표와 버전 범위로 분리합니다.
pub fn parse_rule_id(id: &str) -> Result<(PackageId, IvyRange), RejectionReason> {
    let parts: Vec<&str> = id.splitn(4, ':').collect();
    if parts.len() < 3 {
        return Err(RejectionReason::InvalidPackageId(format!(
            "'{id}' must look like type:namespace:name[:version]"
        )));
    }
    let (pkg_type, namespace, name) = (parts[0].trim(), parts[1].trim(), parts[2].trim());
    let version = parts.get(3).copied().unwrap_or_default();

    if pkg_type.is_empty() {
        return Err(RejectionReason::InvalidPackageId(format!(
            "'{id}' has an empty type"
        )));
    }
    if pkg_type != UNMANAGED_TYPE && (namespace.is_empty() || name.is_empty()) {
        return Err(RejectionReason::InvalidPackageId(format!(
            "'{id}' requires non-empty namespace and name"
        )));
    }

    let range = IvyRange::parse(version)
        .map_err(|e| RejectionReason::InvalidVersionRange(e.to_string()))?;

    Ok((PackageId::new(pkg_type, namespace, name, ""), range))
}

fn validate_item(
    item: &RawFileItem,
    op: PackageOp,
    reuse: bool,
    file_store: &Path,
) -> Result<CurationFileItem, RejectionReason> {
    // 6. 파일 스코프
    let scope = item
        .file_scope
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(RejectionReason::EmptyFileScope)?;

    // 5. 하위 항목 수정자
    let licenses_ops = item
        .file_licenses
        .iter()
        .map(|l| parse_license_op(l, op, scope))
        .collect::<Result<Vec<_>, _>>()?;
    let copyright_ops = item
        .file_copyrights
        .iter()
        .map(|c| parse_copyright_op(c, op, scope))
        .collect::<Result<Vec<_>, _>>()?;

    // 7. 글롭은 delete 계열/update 하위 항목만 있을 때 허용
    if has_glob_meta(scope) {
        let has_insert = licenses_ops.contains(&LicenseOp::Insert)
            || copyright_ops.contains(&CopyrightOp::Insert);
        if has_insert {
            return Err(RejectionReason::GlobNotAllowed(scope.to_owned()));
        }
    }
    let matcher = FileScopeMatcher::new(scope).map_err(|e| RejectionReason::InvalidGlob {
        scope: scope.to_owned(),
        reason: e.to_string(),
    })?;

    // 10. REUSE 제약 (라이선스 개수는 규칙 단위로 검사)
    let in_licenses_folder = scope.starts_with(REUSE_LICENSES_FOLDER);

    // 8. 라이선스 하위 항목
    let mut licenses = Vec::with_capacity(item.file_licenses.len());
    for (raw, license_op) in item.file_licenses.iter().zip(licenses_ops) {
        let license = match raw.license.as_deref().map(str::trim) {
            None | Some("") => return Err(RejectionReason::NullLicense(scope.to_owned())),
            Some(WILDCARD) => LicenseValue::Any,
            Some(value) => LicenseValue::Exact(value.to_owned()),
        };
        let text = LicenseTextRef::from_field(raw.license_text_in_archive.as_deref());

        // update의 '*' 텍스트는 현재 텍스트 유지
        if license_op == LicenseOp::Insert
            && (license == LicenseValue::Any || text == LicenseTextRef::Any)
        {
            return Err(RejectionReason::WildcardInsert(scope.to_owned()));
        }

        if license_op != LicenseOp::Delete
            && let LicenseTextRef::Specific(path) = &text
        {
            if !is_inside_store(path) {
                return Err(RejectionReason::LicenseTextOutsideStore(path.clone()));
            }
            if !file_store.join(path).is_file() {
                return Err(RejectionReason::MissingLicenseText(path.clone()));
            }
        }

        if reuse {
            match (&text, in_licenses_folder) {
                (LicenseTextRef::Absent, true) => {
                    return Err(RejectionReason::ReuseTextRequired(scope.to_owned()));
                }
                (LicenseTextRef::Specific(_), false) => {
                    return Err(RejectionReason::ReuseTextForbidden(scope.to_owned()));
                }
                _ => {}
            }
        }

        licenses.push(LicenseCuration {
            op: license_op,
            license,
            text,
            reason: raw.reason.clone(),
            comment: raw.comment.clone(),
        });
    }

    // 9. 저작권 하위 항목
    let mut copyrights = Vec::with_capacity(item.file_copyrights.len());
    for (raw, copyright_op) in item.file_copyrights.iter().zip(copyright_ops) {
        let value = raw.copyright.as_deref();
        match copyright_op {
            CopyrightOp::Insert => {
                if value.is_none_or(|c| c.trim().is_empty()) {
                    return Err(RejectionReason::EmptyCopyright(scope.to_owned()));
                }
            }
            CopyrightOp::Delete => {
                if value.is_none_or(|c| c.is_empty() || c.contains("**")) {
                    return Err(RejectionReason::InvalidCopyrightPattern(scope.to_owned()));
                }
            }
            CopyrightOp::DeleteAll => {
                if value.is_some() {
                    return Err(RejectionReason::DeleteAllWithCopyright(scope.to_owned()));
                }
            }
        }
        copyrights.push(CopyrightCuration {
            op: copyright_op,
            copyright: value.map(str::to_owned),
            reason: raw.reason.clone(),
            comment: raw.comment.clone(),
        });
    }

    Ok(CurationFileItem {
        file_scope: scope.to_owned(),
        matcher,
        licenses,
        copyrights,
    })
}

fn parse_license_op(
    item: &RawLicenseItem,
    op: PackageOp,
    scope: &str,
) -> Result<LicenseOp, RejectionReason> {
    let not_allowed = || RejectionReason::ModifierNotAllowed {
        modifier: item.modifier.clone(),
        package_modifier: op,
        scope: scope.to_owned(),
    };
    let license_op: LicenseOp = item.modifier.parse().map_err(|_| not_allowed())?;
    if !op.allowed_license_ops().contains(&license_op) {
        return Err(not_allowed());
    }
    Ok(license_op)
}

fn parse_copyright_op(
    item: &RawCopyrightItem,
    op: PackageOp,
    scope: &str,
) -> Result<CopyrightOp, RejectionReason> {
    let not_allowed = || RejectionReason::ModifierNotAllowed {
        modifier: item.modifier.clone(),
        package_modifier: op,
        scope: scope.to_owned(),
    };
    let copyright_op: CopyrightOp = item.modifier.parse().map_err(|_| not_allowed())?;
    if !op.allowed_copyright_ops().contains(&copyright_op) {
        return Err(not_allowed());
    }
    Ok(copyright_op)
}
