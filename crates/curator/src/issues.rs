//! 이슈 조정 -- 규칙의 `resolved_issues`와 패키지에 기록된 이슈를 대조합니다.
//!
//! 양쪽에 모두 있는 ID는 모델에서 제거하고, 한쪽에만 있는 ID는 규칙 작성자를 위한
//! 경고로 보고합니다. 불일치는 검증 실패가 아닙니다.

use std::collections::BTreeSet;

use serde::Serialize;

use clearance_core::model::Pack;
use clearance_core::types::{IssueLevel, PackageId};

/// 조정 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub package: PackageId,
    /// 모델에서 제거된 이슈 ID
    pub resolved: Vec<String>,
    /// 해결됐다고 선언됐지만 기록되지 않은 ID
    pub not_found: Vec<String>,
    /// 기록됐지만 해결 선언이 없는 ID
    pub undeclared: Vec<String>,
}

impl ReconcileReport {
    /// 선언과 실제 이슈가 정확히 일치했는지 확인합니다.
    pub fn is_exact(&self) -> bool {
        self.not_found.is_empty() && self.undeclared.is_empty()
    }
}

/// 이슈 조정기
pub struct IssueReconciler;

impl IssueReconciler {
    /// 패키지 이슈를 선언된 해결 목록과 조정합니다.
    ///
    /// `W*` / `E*`는 현재 기록된 해당 레벨의 모든 ID로 확장됩니다.
    pub fn reconcile(pack: &mut Pack, resolved_issues: &[String]) -> ReconcileReport {
        let present: BTreeSet<String> = pack.all_issues().map(|i| i.id.clone()).collect();

        let mut declared = BTreeSet::new();
        let mut explicit = BTreeSet::new();
        for entry in resolved_issues {
            match wildcard_level(entry) {
                Some(level) => declared.extend(
                    present
                        .iter()
                        .filter(|id| id.starts_with(level.letter()))
                        .cloned(),
                ),
                None => {
                    declared.insert(entry.clone());
                    explicit.insert(entry.clone());
                }
            }
        }

        let resolved: BTreeSet<String> = present.intersection(&declared).cloned().collect();
        pack.remove_issues(&resolved);

        let not_found: Vec<String> = explicit.difference(&present).cloned().collect();
        let undeclared: Vec<String> = present.difference(&declared).cloned().collect();

        for id in &not_found {
            tracing::warn!(
                package = %pack.id,
                issue = %id,
                "issue declared as resolved but not present"
            );
        }
        for id in &undeclared {
            tracing::warn!(
                package = %pack.id,
                issue = %id,
                "issue present but not declared as resolved"
            );
        }

        ReconcileReport {
            package: pack.id.clone(),
            resolved: resolved.into_iter().collect(),
            not_found,
            undeclared,
        }
    }
}

fn wildcard_level(entry: &str) -> Option<IssueLevel> {
    let mut chars = entry.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(letter), Some('*'), None) => IssueLevel::from_letter(letter),
        _ => None,
    }
}
