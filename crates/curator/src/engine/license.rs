//! 파일 라이선스 큐레이션 (insert / delete / update)

use clearance_core::model::{FileLicense, FileLicensing};

use crate::rule::{CurationFileItem, LicenseCuration, LicenseOp, LicenseTextRef};

use super::PackCuration;

impl PackCuration<'_> {
    pub(super) fn license(&mut self, item: &CurationFileItem, curation: &LicenseCuration) {
        match curation.op {
            LicenseOp::Insert => self.insert_license(item, curation),
            LicenseOp::Delete => self.delete_license(item, curation),
            LicenseOp::Update => self.update_license(item, curation),
        }
    }

    fn insert_license(&mut self, item: &CurationFileItem, curation: &LicenseCuration) {
        let Some(license) = curation.license.exact() else {
            return;
        };
        let scope = self.pack.relative_scope(&item.file_scope);

        if self.pack.reuse_compliant
            && self
                .pack
                .file_licensings
                .get(&scope)
                .is_some_and(|f| !f.licenses.is_empty())
        {
            tracing::warn!(
                package = %self.pack.id,
                scope = %scope,
                license,
                "REUSE file already has a license, insert refused"
            );
            return;
        }

        let text = match &curation.text {
            LicenseTextRef::Specific(path) => self.archive_text(path, &scope, license),
            LicenseTextRef::Absent | LicenseTextRef::Any => None,
        };

        let file = self
            .pack
            .file_licensings
            .entry(scope.clone())
            .or_insert_with(|| FileLicensing::new(scope.clone()));
        let exists = file
            .licenses
            .iter()
            .any(|l| l.license == license && l.license_text_in_archive == text);
        if exists {
            return;
        }

        file.licenses.push(FileLicense::new(license, text));
        self.operations += 1;
        tracing::debug!(package = %self.pack.id, scope = %scope, license, "license inserted");
    }

    fn delete_license(&mut self, item: &CurationFileItem, curation: &LicenseCuration) {
        for scope in self.matching_scopes(item) {
            let Some(file) = self.pack.file_licensings.get_mut(&scope) else {
                continue;
            };

            let mut released = Vec::new();
            let before = file.licenses.len();
            file.licenses.retain(|l| {
                let hit = curation.license.matches(&l.license)
                    && curation.text.matches(l.license_text_in_archive.as_deref());
                if hit {
                    released.extend(l.license_text_in_archive.clone());
                }
                !hit
            });
            let removed = before - file.licenses.len();
            if removed == 0 {
                continue;
            }

            self.operations += removed;
            released.extend(self.remove_if_empty(&scope));
            self.release(released);
            tracing::debug!(package = %self.pack.id, scope = %scope, removed, "licenses deleted");
        }
    }

    fn update_license(&mut self, item: &CurationFileItem, curation: &LicenseCuration) {
        for scope in self.matching_scopes(item) {
            let Some(file) = self.pack.file_licensings.get(&scope) else {
                continue;
            };
            let targets: Vec<(usize, String, Option<String>)> = file
                .licenses
                .iter()
                .enumerate()
                .filter(|(_, l)| curation.license.matches(&l.license))
                .map(|(i, l)| (i, l.license.clone(), l.license_text_in_archive.clone()))
                .collect();

            for (index, license, current) in targets {
                let next = match &curation.text {
                    LicenseTextRef::Absent => None,
                    LicenseTextRef::Specific(path) => self.archive_text(path, &scope, &license),
                    LicenseTextRef::Any => continue,
                };
                if next == current {
                    continue;
                }

                let entry = self
                    .pack
                    .file_licensings
                    .get_mut(&scope)
                    .and_then(|f| f.licenses.get_mut(index));
                if let Some(entry) = entry {
                    entry.license_text_in_archive = next;
                    self.operations += 1;
                    self.release(current);
                    tracing::debug!(package = %self.pack.id, scope = %scope, license, "license text updated");
                }
            }
        }
    }
}
