//! 스코프 통합 -- DIR/DEFAULT 집계 재계산과 스코프 간 중복 제거
//!
//! [`ScopeConsolidator::rebuild`]는 FILE 데이터만으로 집계를 다시 만듭니다.
//! 이전 집계에서 가져오는 것은 선언된 기본 라이선스, 기본 라이선스 대상으로
//! 직접 큐레이션된 저작권, 그리고 스코프가 유지되는 집계의 이슈뿐입니다.
//!
//! 중복 제거는 아래 순서로 실행되며, 각 단계는 변경 전 상태의 스냅샷으로
//! 결정을 내린 뒤 한 번에 적용합니다.
//!
//! 1. 파일 ↔ 가장 가까운 상위 스코프 (라이선스)
//! 2. 파일 ↔ 가장 가까운 상위 스코프 (저작권)
//! 3. 디렉토리 ↔ 상위 디렉토리 (라이선스)
//! 4. 디렉토리 ↔ 상위 디렉토리 (저작권)
//! 5. 디렉토리 ↔ 기본 (라이선스, 미확정 표식이 있으면 건너뜀)
//! 6. 디렉토리 ↔ 기본 (저작권)
//!
//! 집계 항목의 출처 파일(`path`가 가리키는 파일)은 1, 2단계에서 제외됩니다.
//! 출처가 사라지면 다음 재계산에서 집계도 사라지기 때문입니다.
//!
//! 마지막으로 비어있는 파일/디렉토리 항목을 제거합니다.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use clearance_core::model::{
    DEFAULT_LICENSING_SCOPE, DefaultCopyright, DefaultLicense, DirCopyright, DirLicense,
    DirLicensing, Pack, UNRESOLVED_LICENSE, is_same_or_ancestor_dir,
};
use clearance_core::types::{PackageId, ScopeLevel};

use crate::archive::LicenseArchive;
use crate::config::CuratorConfig;
use crate::error::CuratorError;
use crate::scope::ScopeClassifier;

/// 중복 제거 단계별 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub file_licenses: usize,
    pub file_copyrights: usize,
    pub dir_licenses: usize,
    pub dir_copyrights: usize,
    pub dir_default_licenses: usize,
    pub dir_default_copyrights: usize,
    /// 제거된 빈 파일/디렉토리 항목
    pub pruned: usize,
}

impl DedupStats {
    /// 제거된 항목 총합
    pub fn total(&self) -> usize {
        self.file_licenses
            + self.file_copyrights
            + self.dir_licenses
            + self.dir_copyrights
            + self.dir_default_licenses
            + self.dir_default_copyrights
            + self.pruned
    }
}

/// 스코프 통합기
#[derive(Debug, Clone)]
pub struct ScopeConsolidator {
    classifier: ScopeClassifier,
    dedup_enabled: bool,
    preserve_file_scopes: bool,
    compare_only_distinct: bool,
}

impl ScopeConsolidator {
    /// 설정으로 통합기를 생성합니다.
    pub fn new(config: &CuratorConfig) -> Result<Self, CuratorError> {
        Ok(Self::with_classifier(ScopeClassifier::new(config)?, config))
    }

    /// 이미 만든 분류기를 사용합니다.
    pub fn with_classifier(classifier: ScopeClassifier, config: &CuratorConfig) -> Self {
        Self {
            classifier,
            dedup_enabled: config.dedup_enabled,
            preserve_file_scopes: config.preserve_file_scopes,
            compare_only_distinct: config.compare_only_distinct,
        }
    }

    /// 집계 재계산, 중복 제거, 빈 항목 정리를 차례로 실행합니다.
    ///
    /// REUSE 패키지는 중복 제거를 건너뜁니다.
    pub fn consolidate(&self, pack: &mut Pack, archive: &LicenseArchive) -> DedupStats {
        let stale = aggregate_texts(pack);
        self.rebuild(pack);
        release_all(pack, archive, stale);

        let mut stats = if self.dedup_enabled && !pack.reuse_compliant {
            self.deduplicate(pack, archive)
        } else {
            DedupStats::default()
        };
        stats.pruned = prune(pack, archive);

        tracing::debug!(
            package = %pack.id,
            removed = stats.total(),
            dirs = pack.dir_licensings.len(),
            defaults = pack.default_licensings.len(),
            "consolidated package scopes"
        );
        stats
    }

    /// FILE 데이터에서 DIR/DEFAULT 집계를 재계산합니다.
    pub fn rebuild(&self, pack: &mut Pack) {
        let mut dirs: BTreeMap<String, DirLicensing> = BTreeMap::new();
        let mut defaults: Vec<DefaultLicense> = pack
            .default_licensings
            .iter()
            .filter(|d| d.declared)
            .cloned()
            .collect();
        let mut default_copyrights: Vec<DefaultCopyright> = pack
            .default_copyrights
            .iter()
            .filter(|c| c.path == DEFAULT_LICENSING_SCOPE)
            .cloned()
            .collect();

        for file in pack.file_licensings.values() {
            let license_level = if pack.reuse_compliant && Pack::is_in_licenses_folder(&file.scope) {
                ScopeLevel::Default
            } else {
                self.classifier.classify(&file.scope)
            };

            match license_level {
                ScopeLevel::Default => {
                    for license in &file.licenses {
                        let duplicate = defaults.iter().any(|d| {
                            !d.declared && d.license == license.license && d.path == file.scope
                        });
                        if duplicate {
                            log_duplicate(&pack.id, &license.license, &file.scope);
                            continue;
                        }
                        defaults.push(DefaultLicense {
                            license: license.license.clone(),
                            license_text_in_archive: license.license_text_in_archive.clone(),
                            path: file.scope.clone(),
                            declared: false,
                            issues: Vec::new(),
                        });
                    }
                }
                ScopeLevel::Dir if !file.licenses.is_empty() => {
                    let dir = dirs
                        .entry(file.dir().to_owned())
                        .or_insert_with(|| DirLicensing::new(file.dir()));
                    for license in &file.licenses {
                        let duplicate = dir
                            .licenses
                            .iter()
                            .any(|d| d.license == license.license && d.path == file.scope);
                        if duplicate {
                            log_duplicate(&pack.id, &license.license, &file.scope);
                            continue;
                        }
                        dir.licenses.push(DirLicense {
                            license: license.license.clone(),
                            license_text_in_archive: license.license_text_in_archive.clone(),
                            path: file.scope.clone(),
                        });
                    }
                }
                _ => {}
            }

            match self.classifier.classify_copyright(&file.scope) {
                ScopeLevel::Default => {
                    for copyright in &file.copyrights {
                        let duplicate = default_copyrights
                            .iter()
                            .any(|d| d.copyright == copyright.copyright && d.path == file.scope);
                        if !duplicate {
                            default_copyrights.push(DefaultCopyright {
                                copyright: copyright.copyright.clone(),
                                path: file.scope.clone(),
                            });
                        }
                    }
                }
                ScopeLevel::Dir if !file.copyrights.is_empty() => {
                    let dir = dirs
                        .entry(file.dir().to_owned())
                        .or_insert_with(|| DirLicensing::new(file.dir()));
                    for copyright in &file.copyrights {
                        let duplicate = dir
                            .copyrights
                            .iter()
                            .any(|d| d.copyright == copyright.copyright && d.path == file.scope);
                        if !duplicate {
                            dir.copyrights.push(DirCopyright {
                                copyright: copyright.copyright.clone(),
                                path: file.scope.clone(),
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        // 이전 집계의 이슈 이전: 스코프가 사라지면 패키지 이슈로
        for (scope, old) in std::mem::take(&mut pack.dir_licensings) {
            if old.issues.is_empty() {
                continue;
            }
            match dirs.get_mut(&scope) {
                Some(dir) => dir.issues.extend(old.issues),
                None => pack.issues.extend(old.issues),
            }
        }
        for old in std::mem::take(&mut pack.default_licensings) {
            if old.declared || old.issues.is_empty() {
                continue;
            }
            let target = defaults
                .iter_mut()
                .find(|d| !d.declared && d.license == old.license && d.path == old.path);
            match target {
                Some(default) => default.issues.extend(old.issues),
                None => pack.issues.extend(old.issues),
            }
        }

        pack.dir_licensings = dirs;
        pack.default_licensings = defaults;
        pack.default_copyrights = default_copyrights;
    }

    /// 여섯 단계의 중복 제거를 순서대로 실행합니다.
    pub fn deduplicate(&self, pack: &mut Pack, archive: &LicenseArchive) -> DedupStats {
        DedupStats {
            file_licenses: self.dedup_file_licenses(pack, archive),
            file_copyrights: self.dedup_file_copyrights(pack),
            dir_licenses: self.dedup_dir_licenses(pack, archive),
            dir_copyrights: self.dedup_dir_copyrights(pack),
            dir_default_licenses: self.dedup_dir_default_licenses(pack, archive),
            dir_default_copyrights: self.dedup_dir_default_copyrights(pack),
            pruned: 0,
        }
    }

    fn same_set(&self, mut own: Vec<&str>, mut enclosing: Vec<&str>) -> bool {
        if own.is_empty() {
            return false;
        }
        if self.compare_only_distinct {
            let own: BTreeSet<&str> = own.into_iter().collect();
            let enclosing: BTreeSet<&str> = enclosing.into_iter().collect();
            return own == enclosing;
        }
        own.sort_unstable();
        enclosing.sort_unstable();
        own == enclosing
    }

    fn dedup_file_licenses(&self, pack: &mut Pack, archive: &LicenseArchive) -> usize {
        let mut plans: Vec<(String, Vec<usize>)> = Vec::new();
        let origins = license_origins(pack);

        for file in pack.file_licensings.values() {
            if file.licenses.is_empty() || origins.contains(file.scope.as_str()) {
                continue;
            }
            let (enclosing, enclosing_texts): (Vec<&str>, BTreeSet<&str>) =
                match nearest_dir(&pack.dir_licensings, file.dir(), false, |d| !d.licenses.is_empty()) {
                    Some(dir) => (
                        dir.licenses.iter().map(|l| l.license.as_str()).collect(),
                        dir.licenses
                            .iter()
                            .filter_map(|l| l.license_text_in_archive.as_deref())
                            .collect(),
                    ),
                    None => (
                        pack.default_licensings.iter().map(|l| l.license.as_str()).collect(),
                        pack.default_licensings
                            .iter()
                            .filter_map(|l| l.license_text_in_archive.as_deref())
                            .collect(),
                    ),
                };

            let own = file.licenses.iter().map(|l| l.license.as_str()).collect();
            if !self.same_set(own, enclosing) {
                continue;
            }

            // 보존 모드에서는 상위 집계와 같은 텍스트를 가리키는 항목만 제거
            let remove: Vec<usize> = file
                .licenses
                .iter()
                .enumerate()
                .filter(|(_, l)| {
                    !self.preserve_file_scopes
                        || l.license_text_in_archive
                            .as_deref()
                            .is_some_and(|t| enclosing_texts.contains(t))
                })
                .map(|(i, _)| i)
                .collect();
            if !remove.is_empty() {
                plans.push((file.scope.clone(), remove));
            }
        }

        let mut removed = 0;
        let mut released = Vec::new();
        for (scope, indices) in plans {
            let Some(file) = pack.file_licensings.get_mut(&scope) else {
                continue;
            };
            let mut index = 0;
            file.licenses.retain(|l| {
                let drop = indices.contains(&index);
                index += 1;
                if drop {
                    released.extend(l.license_text_in_archive.clone());
                }
                !drop
            });
            removed += indices.len();
        }
        release_all(pack, archive, released);
        log_pass(&pack.id, "file licenses", removed);
        removed
    }

    fn dedup_file_copyrights(&self, pack: &mut Pack) -> usize {
        if self.preserve_file_scopes {
            return 0;
        }

        let mut plans: Vec<String> = Vec::new();
        let origins = copyright_origins(pack);
        for file in pack.file_licensings.values() {
            if origins.contains(file.scope.as_str()) {
                continue;
            }
            let enclosing: Vec<&str> =
                match nearest_dir(&pack.dir_licensings, file.dir(), false, |d| !d.copyrights.is_empty()) {
                    Some(dir) => dir.copyrights.iter().map(|c| c.copyright.as_str()).collect(),
                    None => pack
                        .default_copyrights
                        .iter()
                        .map(|c| c.copyright.as_str())
                        .collect(),
                };
            let own = file.copyrights.iter().map(|c| c.copyright.as_str()).collect();
            if self.same_set(own, enclosing) {
                plans.push(file.scope.clone());
            }
        }

        let mut removed = 0;
        for scope in plans {
            if let Some(file) = pack.file_licensings.get_mut(&scope) {
                removed += file.copyrights.len();
                file.copyrights.clear();
            }
        }
        log_pass(&pack.id, "file copyrights", removed);
        removed
    }

    fn dedup_dir_licenses(&self, pack: &mut Pack, archive: &LicenseArchive) -> usize {
        let plans: Vec<String> = pack
            .dir_licensings
            .values()
            .filter(|dir| {
                nearest_dir(&pack.dir_licensings, &dir.scope, true, |d| !d.licenses.is_empty())
                    .is_some_and(|parent| {
                        self.same_set(
                            dir.licenses.iter().map(|l| l.license.as_str()).collect(),
                            parent.licenses.iter().map(|l| l.license.as_str()).collect(),
                        )
                    })
            })
            .map(|dir| dir.scope.clone())
            .collect();

        let removed = clear_dir_licenses(pack, archive, &plans);
        log_pass(&pack.id, "dir licenses", removed);
        removed
    }

    fn dedup_dir_copyrights(&self, pack: &mut Pack) -> usize {
        let plans: Vec<String> = pack
            .dir_licensings
            .values()
            .filter(|dir| {
                nearest_dir(&pack.dir_licensings, &dir.scope, true, |d| !d.copyrights.is_empty())
                    .is_some_and(|parent| {
                        self.same_set(
                            dir.copyrights.iter().map(|c| c.copyright.as_str()).collect(),
                            parent.copyrights.iter().map(|c| c.copyright.as_str()).collect(),
                        )
                    })
            })
            .map(|dir| dir.scope.clone())
            .collect();

        let removed = clear_dir_copyrights(pack, &plans);
        log_pass(&pack.id, "dir copyrights", removed);
        removed
    }

    fn dedup_dir_default_licenses(&self, pack: &mut Pack, archive: &LicenseArchive) -> usize {
        let defaults: Vec<&str> = pack
            .default_licensings
            .iter()
            .map(|d| d.license.as_str())
            .collect();

        let plans: Vec<String> = pack
            .dir_licensings
            .values()
            .filter(|dir| !dir.licenses.iter().any(|l| l.license == UNRESOLVED_LICENSE))
            .filter(|dir| {
                self.same_set(
                    dir.licenses.iter().map(|l| l.license.as_str()).collect(),
                    defaults.clone(),
                )
            })
            .map(|dir| dir.scope.clone())
            .collect();

        let removed = clear_dir_licenses(pack, archive, &plans);
        log_pass(&pack.id, "dir vs default licenses", removed);
        removed
    }

    fn dedup_dir_default_copyrights(&self, pack: &mut Pack) -> usize {
        let defaults: Vec<&str> = pack
            .default_copyrights
            .iter()
            .map(|c| c.copyright.as_str())
            .collect();

        let plans: Vec<String> = pack
            .dir_licensings
            .values()
            .filter(|dir| {
                self.same_set(
                    dir.copyrights.iter().map(|c| c.copyright.as_str()).collect(),
                    defaults.clone(),
                )
            })
            .map(|dir| dir.scope.clone())
            .collect();

        let removed = clear_dir_copyrights(pack, &plans);
        log_pass(&pack.id, "dir vs default copyrights", removed);
        removed
    }
}

/// 비어있는 파일/디렉토리 항목을 제거하고 제거된 수를 반환합니다.
///
/// 디렉토리 이슈는 패키지 이슈로 옮겨지고, 파일의 아카이브 원본은 해제됩니다.
pub fn prune(pack: &mut Pack, archive: &LicenseArchive) -> usize {
    let empty_files: Vec<String> = pack
        .file_licensings
        .values()
        .filter(|f| f.is_empty())
        .map(|f| f.scope.clone())
        .collect();

    let mut released = Vec::new();
    for scope in &empty_files {
        if let Some(file) = pack.file_licensings.remove(scope) {
            released.extend(file.file_content_in_archive);
        }
    }

    let mut orphan_issues = Vec::new();
    let dirs_before = pack.dir_licensings.len();
    pack.dir_licensings.retain(|_, dir| {
        if dir.is_empty() {
            orphan_issues.append(&mut dir.issues);
            false
        } else {
            true
        }
    });
    let pruned_dirs = dirs_before - pack.dir_licensings.len();
    pack.issues.extend(orphan_issues);

    release_all(pack, archive, released);
    empty_files.len() + pruned_dirs
}

/// 라이선스 집계 항목을 만든 파일 스코프
fn license_origins(pack: &Pack) -> BTreeSet<&str> {
    pack.dir_licensings
        .values()
        .flat_map(|d| d.licenses.iter().map(|l| l.path.as_str()))
        .chain(
            pack.default_licensings
                .iter()
                .filter(|d| !d.declared)
                .map(|d| d.path.as_str()),
        )
        .collect()
}

/// 저작권 집계 항목을 만든 파일 스코프
fn copyright_origins(pack: &Pack) -> BTreeSet<&str> {
    pack.dir_licensings
        .values()
        .flat_map(|d| d.copyrights.iter().map(|c| c.path.as_str()))
        .chain(pack.default_copyrights.iter().map(|c| c.path.as_str()))
        .collect()
}

/// 재계산 전 집계가 가리키던 아카이브 텍스트
fn aggregate_texts(pack: &Pack) -> Vec<String> {
    pack.dir_licensings
        .values()
        .flat_map(|d| d.licenses.iter())
        .filter_map(|l| l.license_text_in_archive.clone())
        .chain(
            pack.default_licensings
                .iter()
                .filter(|d| !d.declared)
                .filter_map(|d| d.license_text_in_archive.clone()),
        )
        .collect()
}

/// `dir`과 같거나 상위인 디렉토리 집계 중 가장 가까운 것을 찾습니다.
fn nearest_dir<'p>(
    dirs: &'p BTreeMap<String, DirLicensing>,
    dir: &str,
    strict: bool,
    has_entries: impl Fn(&DirLicensing) -> bool,
) -> Option<&'p DirLicensing> {
    dirs.values()
        .filter(|candidate| !(strict && candidate.scope == dir))
        .filter(|candidate| is_same_or_ancestor_dir(&candidate.scope, dir))
        .filter(|candidate| has_entries(*candidate))
        .max_by_key(|candidate| candidate.scope.len())
}

fn clear_dir_licenses(pack: &mut Pack, archive: &LicenseArchive, scopes: &[String]) -> usize {
    let mut removed = 0;
    let mut released = Vec::new();
    for scope in scopes {
        if let Some(dir) = pack.dir_licensings.get_mut(scope) {
            removed += dir.licenses.len();
            released.extend(
                dir.licenses
                    .drain(..)
                    .filter_map(|l| l.license_text_in_archive),
            );
        }
    }
    release_all(pack, archive, released);
    removed
}

fn clear_dir_copyrights(pack: &mut Pack, scopes: &[String]) -> usize {
    let mut removed = 0;
    for scope in scopes {
        if let Some(dir) = pack.dir_licensings.get_mut(scope) {
            removed += dir.copyrights.len();
            dir.copyrights.clear();
        }
    }
    removed
}

fn release_all(pack: &Pack, archive: &LicenseArchive, names: Vec<String>) {
    let names: BTreeSet<String> = names.into_iter().collect();
    for name in names {
        archive.release(pack, &name);
    }
}

fn log_duplicate(package: &PackageId, license: &str, path: &str) {
    if license == UNRESOLVED_LICENSE {
        tracing::info!(%package, license, path, "duplicate aggregate entry dropped");
    } else {
        tracing::debug!(%package, license, path, "duplicate aggregate entry dropped");
    }
}

fn log_pass(package: &PackageId, pass: &str, removed: usize) {
    if removed > 0 {
        tracing::debug!(%package, pass, removed, "dedup pass removed entries");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CuratorConfigBuilder;
    use clearance_core::model::{FileCopyright, FileLicense, FileLicensing};
    use clearance_core::types::{Issue, IssueLevel};
    use tempfile::TempDir;

    fn consolidator(preserve: bool) -> ScopeConsolidator {
        let config = CuratorConfigBuilder::new()
            .scope_patterns(vec!["LICENSE*".to_owned(), "COPYING".to_owned()])
            .copyright_scope_patterns(vec!["NOTICE".to_owned()])
            .ignore_patterns(vec!["*.c".to_owned()])
            .preserve_file_scopes(preserve)
            .build()
            .unwrap();
        ScopeConsolidator::new(&config).unwrap()
    }

    fn add_file(pack: &mut Pack, scope: &str, licenses: &[(&str, Option<&str>)], copyrights: &[&str]) {
        let mut file = FileLicensing::new(scope);
        for (license, text) in licenses {
            file.licenses
                .push(FileLicense::new(*license, text.map(str::to_owned)));
        }
        for copyright in copyrights {
            file.copyrights.push(FileCopyright::new(*copyright));
        }
        pack.file_licensings.insert(scope.to_owned(), file);
    }

    fn pack() -> Pack {
        Pack::new(PackageId::new("Maven", "org.example", "lib", "1.0"))
    }

    #[test]
    fn rebuild_derives_dir_and_default_aggregates() {
        let mut pack = pack();
        add_file(&mut pack, "LICENSE", &[("MIT", Some("root.txt"))], &[]);
        add_file(&mut pack, "sub/LICENSE", &[("Apache-2.0", Some("sub.txt"))], &[]);
        add_file(&mut pack, "sub/readme.txt", &[("MIT", None)], &[]);
        add_file(&mut pack, "NOTICE", &[], &["Copyright ACME"]);

        consolidator(false).rebuild(&mut pack);

        assert_eq!(pack.default_licensings.len(), 1);
        assert_eq!(pack.default_licensings[0].path, "LICENSE");
        assert_eq!(pack.dir_licensings.len(), 1);
        assert_eq!(pack.dir_licensings["sub"].licenses[0].license, "Apache-2.0");
        assert_eq!(pack.default_copyrights.len(), 1);
    }

    #[test]
    fn rebuild_ignores_previous_aggregates_but_keeps_declared() {
        let mut pack = pack();
        pack.default_licensings.push(DefaultLicense::declared("BSD-3-Clause", None));
        pack.default_licensings.push(DefaultLicense {
            license: "GPL-2.0-only".to_owned(),
            license_text_in_archive: None,
            path: "gone/LICENSE".to_owned(),
            declared: false,
            issues: Vec::new(),
        });
        pack.dir_licensings.insert("stale".to_owned(), DirLicensing::new("stale"));

        consolidator(false).rebuild(&mut pack);

        assert_eq!(pack.default_licensings.len(), 1);
        assert!(pack.default_licensings[0].declared);
        assert!(pack.dir_licensings.is_empty());
    }

    #[test]
    fn rebuild_drops_duplicate_license_path_pairs() {
        let mut pack = pack();
        let mut file = FileLicensing::new("LICENSE");
        let mut first = FileLicense::new(UNRESOLVED_LICENSE, None);
        first.start_line = Some(1);
        let mut second = FileLicense::new(UNRESOLVED_LICENSE, None);
        second.start_line = Some(40);
        file.licenses = vec![first, second];
        pack.file_licensings.insert("LICENSE".to_owned(), file);

        consolidator(false).rebuild(&mut pack);
        assert_eq!(pack.default_licensings.len(), 1);
    }

    #[test]
    fn rebuild_moves_issues_of_vanished_scopes_to_package() {
        let mut pack = pack();
        add_file(&mut pack, "kept/LICENSE", &[("MIT", None)], &[]);
        let issue = |id: &str| Issue {
            id: id.to_owned(),
            level: IssueLevel::Warn,
            message: "dir issue".to_owned(),
            package: None,
        };
        let mut kept = DirLicensing::new("kept");
        kept.issues.push(issue("W01"));
        let mut gone = DirLicensing::new("gone");
        gone.issues.push(issue("W02"));
        pack.dir_licensings.insert("kept".to_owned(), kept);
        pack.dir_licensings.insert("gone".to_owned(), gone);

        consolidator(false).rebuild(&mut pack);

        assert_eq!(pack.dir_licensings["kept"].issues[0].id, "W01");
        assert_eq!(pack.issues.len(), 1);
        assert_eq!(pack.issues[0].id, "W02");
    }

    #[test]
    fn identical_sets_collapse_upward_to_default() {
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        add_file(&mut pack, "LICENSE", &[("MIT", None)], &[]);
        add_file(&mut pack, "d/LICENSE", &[("MIT", None)], &[]);
        add_file(&mut pack, "d/a.txt", &[("MIT", None)], &[]);
        add_file(&mut pack, "d/b.txt", &[("MIT", None)], &[]);

        let stats = consolidator(false).consolidate(&mut pack, &archive);

        let files: Vec<&str> = pack.file_licensings.keys().map(String::as_str).collect();
        assert_eq!(files, ["LICENSE", "d/LICENSE"]);
        assert!(pack.dir_licensings.is_empty());
        assert_eq!(pack.default_licensings.len(), 1);
        assert_eq!(pack.default_licensings[0].license, "MIT");
        assert_eq!(stats.dir_default_licenses, 1);
    }

    #[test]
    fn preserve_file_scopes_keeps_entries_without_blob_collision() {
        let staging = TempDir::new().unwrap();
        std::fs::write(staging.path().join("mit.txt"), "MIT").unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        add_file(&mut pack, "LICENSE", &[("MIT", Some("mit.txt"))], &[]);
        add_file(&mut pack, "src/main.rs", &[("MIT", None)], &[]);

        consolidator(true).consolidate(&mut pack, &archive);

        assert_eq!(pack.file_licensings["LICENSE"].licenses.len(), 1);
        assert_eq!(pack.file_licensings["src/main.rs"].licenses.len(), 1);
        assert!(archive.contains("mit.txt"));
    }

    #[test]
    fn differing_sets_are_kept() {
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        add_file(&mut pack, "LICENSE", &[("MIT", None)], &[]);
        add_file(&mut pack, "src/vendored.js", &[("BSD-2-Clause", None)], &[]);

        consolidator(false).consolidate(&mut pack, &archive);
        assert_eq!(pack.file_licensings["src/vendored.js"].licenses.len(), 1);
    }

    #[test]
    fn nested_dir_collapses_into_parent_dir() {
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        add_file(&mut pack, "LICENSE", &[("MIT", None)], &[]);
        add_file(&mut pack, "a/LICENSE", &[("GPL-2.0-only", None)], &[]);
        add_file(&mut pack, "a/b/COPYING", &[("GPL-2.0-only", None)], &[]);

        let mut stats = DedupStats::default();
        let c = consolidator(false);
        c.rebuild(&mut pack);
        stats.dir_licenses = c.dedup_dir_licenses(&mut pack, &archive);

        assert_eq!(stats.dir_licenses, 1);
        assert!(pack.dir_licensings["a/b"].licenses.is_empty());
        assert_eq!(pack.dir_licensings["a"].licenses.len(), 1);
    }

    #[test]
    fn unresolved_marker_stays_visible_at_dir_level() {
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        add_file(&mut pack, "LICENSE", &[(UNRESOLVED_LICENSE, None)], &[]);
        add_file(&mut pack, "x/LICENSE", &[(UNRESOLVED_LICENSE, None)], &[]);

        consolidator(false).consolidate(&mut pack, &archive);
        assert_eq!(pack.dir_licensings["x"].licenses.len(), 1);
    }

    #[test]
    fn multiset_comparison_when_not_distinct() {
        let config = CuratorConfigBuilder::new()
            .scope_patterns(vec!["LICENSE".to_owned()])
            .compare_only_distinct(false)
            .build()
            .unwrap();
        let c = ScopeConsolidator::new(&config).unwrap();
        assert!(!c.same_set(vec!["MIT", "MIT"], vec!["MIT"]));
        assert!(c.same_set(vec!["MIT", "ISC"], vec!["ISC", "MIT"]));

        let distinct = consolidator(false);
        assert!(distinct.same_set(vec!["MIT", "MIT"], vec!["MIT"]));
        assert!(!distinct.same_set(vec![], vec![]));
    }

    #[test]
    fn copyright_dedup_against_default() {
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        add_file(&mut pack, "NOTICE", &[], &["Copyright ACME"]);
        add_file(&mut pack, "src/a.c", &[], &["Copyright ACME"]);
        add_file(&mut pack, "src/b.c", &[], &["Copyright Other"]);

        consolidator(false).consolidate(&mut pack, &archive);

        assert!(!pack.file_licensings.contains_key("src/a.c"));
        assert_eq!(pack.file_licensings["src/b.c"].copyrights.len(), 1);
        assert_eq!(pack.default_copyrights.len(), 1);
    }

    #[test]
    fn reuse_package_skips_dedup() {
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        pack.reuse_compliant = true;
        add_file(&mut pack, "LICENSES/MIT.txt", &[("MIT", None)], &[]);
        add_file(&mut pack, "src/lib.rs", &[("MIT", None)], &[]);

        consolidator(false).consolidate(&mut pack, &archive);

        assert_eq!(pack.default_licensings.len(), 1);
        assert_eq!(pack.default_licensings[0].path, "LICENSES/MIT.txt");
        assert_eq!(pack.file_licensings["src/lib.rs"].licenses.len(), 1);
    }

    #[test]
    fn consolidate_is_idempotent() {
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        add_file(&mut pack, "LICENSE", &[("MIT", None)], &[]);
        add_file(&mut pack, "d/LICENSE", &[("MIT", None)], &[]);
        add_file(&mut pack, "d/a.txt", &[("MIT", None)], &[]);
        add_file(&mut pack, "NOTICE", &[], &["Copyright ACME"]);
        add_file(&mut pack, "src/a.c", &[], &["Copyright ACME"]);

        let c = consolidator(false);
        c.consolidate(&mut pack, &archive);
        let first = serde_json::to_value(&pack).unwrap();
        c.consolidate(&mut pack, &archive);

        assert_eq!(serde_json::to_value(&pack).unwrap(), first);
        assert_eq!(pack.default_licensings.len(), 1);
        assert_eq!(pack.default_copyrights.len(), 1);
        assert!(!pack.file_licensings.contains_key("d/a.txt"));
    }

    #[test]
    fn aggregate_origin_files_survive_dedup() {
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        add_file(&mut pack, "LICENSE", &[("MIT", None)], &[]);
        add_file(&mut pack, "NOTICE", &[], &["Copyright ACME"]);

        let stats = consolidator(false).consolidate(&mut pack, &archive);

        assert_eq!(stats.file_licenses, 0);
        assert_eq!(stats.file_copyrights, 0);
        assert_eq!(pack.file_licensings["LICENSE"].licenses.len(), 1);
        assert_eq!(pack.file_licensings["NOTICE"].copyrights.len(), 1);
    }

    #[test]
    fn rebuild_releases_texts_of_vanished_aggregates() {
        let staging = TempDir::new().unwrap();
        std::fs::write(staging.path().join("old.txt"), "GPL").unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        pack.default_licensings.push(DefaultLicense {
            license: "GPL-2.0-only".to_owned(),
            license_text_in_archive: Some("old.txt".to_owned()),
            path: "LICENSE".to_owned(),
            declared: false,
            issues: Vec::new(),
        });

        consolidator(false).consolidate(&mut pack, &archive);

        assert!(pack.default_licensings.is_empty());
        assert!(!archive.contains("old.txt"));
    }

    #[test]
    fn prune_releases_content_of_removed_files() {
        let staging = TempDir::new().unwrap();
        std::fs::write(staging.path().join("content.c"), "int x;").unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        let mut file = FileLicensing::new("src/x.c");
        file.file_content_in_archive = Some("content.c".to_owned());
        pack.file_licensings.insert("src/x.c".to_owned(), file);

        assert_eq!(prune(&mut pack, &archive), 1);
        assert!(pack.file_licensings.is_empty());
        assert!(!archive.contains("content.c"));
    }
}
