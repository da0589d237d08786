//! 큐레이션 엔진 -- 규칙을 패키지 모델에 적용하는 2단계 상태 전이
//!
//! # 처리 순서
//!
//! 1. **패키지 단계**: insert 규칙으로 패키지를 생성한 뒤 delete 규칙으로 패키지를
//!    제거합니다. 제거된 패키지가 참조하던 아카이브 파일도 함께 삭제됩니다.
//! 2. **파일 단계**: insert/update 규칙이 일치하는 패키지마다
//!    - 이슈 조정 ([`IssueReconciler`], update 규칙)
//!    - 라이선스 항목: delete → insert → update
//!    - 저작권 항목: delete-all → delete → insert
//!    - 변경이 있으면 [`ScopeConsolidator`]로 집계 재계산과 중복 제거
//!
//! 패키지는 순차적으로 처리됩니다. 아카이브 이름 할당이 디렉토리 상태에
//! 의존하므로 병렬화하려면 아카이브 접근을 직렬화해야 합니다.
//!
//! 개별 작업의 실패(아카이브 원본 누락 등)는 로그와 이슈로 남기고 계속 진행하며,
//! 여러 규칙이 일치하는 패키지는 큐레이션하지 않습니다.

mod copyright;
mod default;
mod license;

pub use copyright::wildcard_match;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use clearance_core::model::{Pack, Project};
use clearance_core::types::{IssueLevel, PackageId};

use crate::archive::LicenseArchive;
use crate::config::CuratorConfig;
use crate::consolidate::ScopeConsolidator;
use crate::error::CuratorError;
use crate::issues::{IssueReconciler, ReconcileReport};
use crate::rule::{CopyrightOp, CurationFileItem, CurationRule, CurationRuleStore, LicenseOp, PackageOp};

/// 라이선스 하위 항목 적용 순서
const LICENSE_ORDER: [LicenseOp; 3] = [LicenseOp::Delete, LicenseOp::Insert, LicenseOp::Update];

/// 저작권 하위 항목 적용 순서
const COPYRIGHT_ORDER: [CopyrightOp; 3] =
    [CopyrightOp::DeleteAll, CopyrightOp::Delete, CopyrightOp::Insert];

/// 큐레이션 실행 결과
#[derive(Debug, Clone, Default, Serialize)]
pub struct CurationReport {
    /// insert 규칙으로 생성된 패키지
    pub inserted: Vec<PackageId>,
    /// delete 규칙으로 제거된 패키지
    pub deleted: Vec<PackageId>,
    /// 파일 단계 큐레이션이 실행된 패키지
    pub curated: Vec<PackageId>,
    /// 규칙이 둘 이상 일치해 건너뛴 패키지
    pub ambiguous: Vec<PackageId>,
    /// 집계가 재계산된 패키지
    pub consolidated: Vec<PackageId>,
    /// 모델을 변경한 하위 작업 수
    pub operations: usize,
    /// 아카이브 실패 수
    pub archive_errors: usize,
    /// 중복 제거로 사라진 항목 수
    pub dedup_removed: usize,
    /// 이슈 조정 결과
    pub reconciliations: Vec<ReconcileReport>,
}

/// 큐레이션 엔진
pub struct CurationEngine<'a> {
    config: &'a CuratorConfig,
    store: &'a CurationRuleStore,
    archive: &'a LicenseArchive,
    consolidator: ScopeConsolidator,
}

impl<'a> CurationEngine<'a> {
    /// 설정, 규칙 저장소, 아카이브로 엔진을 생성합니다.
    pub fn new(
        config: &'a CuratorConfig,
        store: &'a CurationRuleStore,
        archive: &'a LicenseArchive,
    ) -> Result<Self, CuratorError> {
        Ok(Self {
            config,
            store,
            archive,
            consolidator: ScopeConsolidator::new(config)?,
        })
    }

    /// 프로젝트에 모든 규칙을 적용합니다.
    pub fn apply(&self, project: &mut Project) -> CurationReport {
        let mut report = CurationReport::default();
        if !self.config.curation_enabled {
            tracing::info!("curation disabled, model left unchanged");
            return report;
        }

        let created = self.insert_packages(project, &mut report);
        self.delete_packages(project, &created, &mut report);
        self.curate_packages(project, &created, &mut report);

        tracing::info!(
            inserted = report.inserted.len(),
            deleted = report.deleted.len(),
            curated = report.curated.len(),
            ambiguous = report.ambiguous.len(),
            operations = report.operations,
            archive_errors = report.archive_errors,
            "curation finished"
        );
        report
    }

    /// 큐레이션 여부와 관계없이 모든 패키지를 통합합니다.
    pub fn consolidate_all(&self, project: &mut Project) -> usize {
        project
            .packs
            .iter_mut()
            .map(|pack| self.consolidator.consolidate(pack, self.archive).total())
            .sum()
    }

    fn insert_packages(
        &self,
        project: &mut Project,
        report: &mut CurationReport,
    ) -> BTreeMap<PackageId, &'a CurationRule> {
        let store: &'a CurationRuleStore = self.store;
        let mut created = BTreeMap::new();

        for rule in store.rules_with(PackageOp::Insert) {
            let target = rule.insert_target();

            if let Some(existing) = project
                .packs
                .iter()
                .find(|p| p.id == target || rule.matches(&p.id))
            {
                tracing::info!(
                    package = %existing.id,
                    rule_id = %rule.id,
                    "package already exists, insert skipped"
                );
                continue;
            }

            if rule.matches(&target) {
                if let Err(e) = store.find_rule_for(&target) {
                    tracing::error!(package = %target, error = %e, "package not inserted");
                    report.ambiguous.push(target);
                    continue;
                }
            }

            let mut pack = Pack::new(target.clone());
            pack.repository = rule.repository.clone();
            pack.reuse_compliant = rule.targets_reuse_package();
            let reuse = pack.reuse_compliant;
            project.packs.push(pack);

            let cleared = project.clear_root_issues_for(&target);
            tracing::info!(
                package = %target,
                rule_id = %rule.id,
                reuse,
                cleared_issues = cleared,
                "package inserted"
            );
            report.inserted.push(target.clone());
            created.insert(target, rule);
        }

        created
    }

    fn delete_packages(
        &self,
        project: &mut Project,
        created: &BTreeMap<PackageId, &'a CurationRule>,
        report: &mut CurationReport,
    ) {
        let doomed: Vec<PackageId> = project
            .packs
            .iter()
            .filter(|p| !created.contains_key(&p.id))
            .filter(|p| {
                matches!(
                    self.store.find_rule_for(&p.id),
                    Ok(Some(rule)) if rule.op == PackageOp::Delete
                )
            })
            .map(|p| p.id.clone())
            .collect();

        for id in doomed {
            let Some(pack) = project.remove_pack(&id) else {
                continue;
            };

            let mut purged = 0;
            for name in pack.archive_references() {
                if project.packs.iter().any(|p| p.references_blob(name)) {
                    continue;
                }
                match self.archive.remove(name) {
                    Ok(true) => purged += 1,
                    Ok(false) => {}
                    Err(e) => tracing::warn!(package = %id, name, error = %e, "failed to purge archived file"),
                }
            }

            tracing::info!(package = %id, purged, "package deleted");
            report.deleted.push(id);
        }
    }

    fn curate_packages(
        &self,
        project: &mut Project,
        created: &BTreeMap<PackageId, &'a CurationRule>,
        report: &mut CurationReport,
    ) {
        for pack in &mut project.packs {
            let rule = match created.get(&pack.id) {
                Some(rule) => *rule,
                None => match self.store.find_rule_for(&pack.id) {
                    Ok(Some(rule)) => rule,
                    Ok(None) => continue,
                    Err(CuratorError::AmbiguousRule { rules, .. }) => {
                        tracing::error!(
                            package = %pack.id,
                            rules = %rules.join(", "),
                            "more than one curation rule matches, package skipped"
                        );
                        pack.record_issue(
                            IssueLevel::Error,
                            format!("curation skipped: rules {} all match", rules.join(", ")),
                        );
                        report.ambiguous.push(pack.id.clone());
                        continue;
                    }
                    Err(e) => {
                        tracing::error!(package = %pack.id, error = %e, "rule lookup failed");
                        continue;
                    }
                },
            };

            if rule.op == PackageOp::Delete {
                continue;
            }
            self.curate_pack(pack, rule, report);
        }
    }

    fn curate_pack(&self, pack: &mut Pack, rule: &CurationRule, report: &mut CurationReport) {
        if rule.op == PackageOp::Update {
            report
                .reconciliations
                .push(IssueReconciler::reconcile(pack, &rule.resolved_issues));
        }

        let mut cx = PackCuration::new(pack, self.archive, self.store.file_store());

        for op in LICENSE_ORDER {
            for item in rule.file_items() {
                for curation in item.licenses.iter().filter(|c| c.op == op) {
                    cx.license(item, curation);
                }
            }
            for item in rule.default_items() {
                for curation in item.licenses.iter().filter(|c| c.op == op) {
                    cx.default_license(curation);
                }
            }
        }

        for op in COPYRIGHT_ORDER {
            for item in rule.file_items() {
                for curation in item.copyrights.iter().filter(|c| c.op == op) {
                    cx.copyright(item, curation);
                }
            }
            for item in rule.default_items() {
                for curation in item.copyrights.iter().filter(|c| c.op == op) {
                    cx.default_copyright(curation);
                }
            }
        }

        let (operations, archive_errors) = (cx.operations, cx.archive_errors);
        report.operations += operations;
        report.archive_errors += archive_errors;
        report.curated.push(pack.id.clone());

        tracing::debug!(
            package = %pack.id,
            rule_id = %rule.id,
            operations,
            archive_errors,
            "package curated"
        );

        if operations > 0 {
            let stats = self.consolidator.consolidate(pack, self.archive);
            report.dedup_removed += stats.total();
            report.consolidated.push(pack.id.clone());
        }
    }
}

/// 한 패키지에 대한 하위 작업 컨텍스트
struct PackCuration<'p> {
    pack: &'p mut Pack,
    archive: &'p LicenseArchive,
    file_store: &'p Path,
    operations: usize,
    archive_errors: usize,
}

impl<'p> PackCuration<'p> {
    fn new(pack: &'p mut Pack, archive: &'p LicenseArchive, file_store: &'p Path) -> Self {
        Self {
            pack,
            archive,
            file_store,
            operations: 0,
            archive_errors: 0,
        }
    }

    /// 파일 저장소의 텍스트를 아카이브합니다. 실패하면 에러 이슈를 남기고 `None`.
    fn archive_text(&mut self, store_path: &str, scope: &str, license: &str) -> Option<String> {
        let source = self.file_store.join(store_path);
        match self.archive.add(&source, &self.pack.id, scope, Some(license)) {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::error!(
                    package = %self.pack.id,
                    scope,
                    path = store_path,
                    error = %e,
                    "failed to archive license text"
                );
                self.pack.record_issue(
                    IssueLevel::Error,
                    format!("license text '{store_path}' for '{scope}' could not be archived: {e}"),
                );
                self.archive_errors += 1;
                None
            }
        }
    }

    /// 더 이상 참조되지 않는 아카이브 파일을 해제합니다.
    fn release(&self, names: impl IntoIterator<Item = String>) {
        for name in names {
            self.archive.release(&*self.pack, &name);
        }
    }

    /// 큐레이션 항목의 파일 스코프와 일치하는 모델 스코프
    ///
    /// 패턴은 패키지 루트 기준 경로와 저장소 기준 경로 모두에 대해 검사합니다.
    fn matching_scopes(&self, item: &CurationFileItem) -> Vec<String> {
        let root = self.pack.package_root.trim_end_matches('/');
        self.pack
            .file_licensings
            .keys()
            .filter(|scope| {
                item.matcher.is_match(scope)
                    || (!root.is_empty() && item.matcher.is_match(&format!("{root}/{scope}")))
            })
            .cloned()
            .collect()
    }

    /// 비어있는 파일 항목을 제거하고 그 아카이브 원본 이름을 반환합니다.
    fn remove_if_empty(&mut self, scope: &str) -> Option<String> {
        if !self.pack.file_licensings.get(scope)?.is_empty() {
            return None;
        }
        self.pack
            .file_licensings
            .remove(scope)
            .and_then(|file| file.file_content_in_archive)
    }
}
