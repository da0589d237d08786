//! 패키지 기본 라이선스 큐레이션
//!
//! 파일 스코프가 [`DEFAULT_LICENSING_SCOPE`]인 항목은 파일 모델을 거치지 않고
//! 선언된(`declared = true`) 기본 라이선스를 직접 변경합니다. 같은 대상의 저작권
//! 항목은 경로가 기본 라이선스 표식인 기본 저작권으로 기록됩니다.

use clearance_core::model::{DEFAULT_LICENSING_SCOPE, DefaultCopyright, DefaultLicense};

use crate::rule::{CopyrightCuration, CopyrightOp, LicenseCuration, LicenseOp, LicenseTextRef};

use super::PackCuration;
use super::copyright::wildcard_match;

/// 기본 라이선스 텍스트의 아카이브 이름에 쓰는 상대 경로
const DEFAULT_ARCHIVE_PATH: &str = "DEFAULT_LICENSING";

impl PackCuration<'_> {
    pub(super) fn default_license(&mut self, curation: &LicenseCuration) {
        match curation.op {
            LicenseOp::Insert => {
                let Some(license) = curation.license.exact() else {
                    return;
                };
                let text = match &curation.text {
                    LicenseTextRef::Specific(path) => {
                        self.archive_text(path, DEFAULT_ARCHIVE_PATH, license)
                    }
                    LicenseTextRef::Absent | LicenseTextRef::Any => None,
                };
                let exists = self.pack.default_licensings.iter().any(|d| {
                    d.declared && d.license == license && d.license_text_in_archive == text
                });
                if !exists {
                    self.pack
                        .default_licensings
                        .push(DefaultLicense::declared(license, text));
                    self.operations += 1;
                }
            }
            LicenseOp::Delete => {
                let mut released = Vec::new();
                let before = self.pack.default_licensings.len();
                self.pack.default_licensings.retain(|d| {
                    let hit = d.declared
                        && curation.license.matches(&d.license)
                        && curation.text.matches(d.license_text_in_archive.as_deref());
                    if hit {
                        released.extend(d.license_text_in_archive.clone());
                    }
                    !hit
                });
                self.operations += before - self.pack.default_licensings.len();
                self.release(released);
            }
            LicenseOp::Update => {
                let targets: Vec<(usize, String, Option<String>)> = self
                    .pack
                    .default_licensings
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| d.declared && curation.license.matches(&d.license))
                    .map(|(i, d)| (i, d.license.clone(), d.license_text_in_archive.clone()))
                    .collect();

                for (index, license, current) in targets {
                    let next = match &curation.text {
                        LicenseTextRef::Absent => None,
                        LicenseTextRef::Specific(path) => {
                            self.archive_text(path, DEFAULT_ARCHIVE_PATH, &license)
                        }
                        LicenseTextRef::Any => continue,
                    };
                    if next == current {
                        continue;
                    }
                    if let Some(entry) = self.pack.default_licensings.get_mut(index) {
                        entry.license_text_in_archive = next;
                        self.operations += 1;
                        self.release(current);
                    }
                }
            }
        }
    }

    pub(super) fn default_copyright(&mut self, curation: &CopyrightCuration) {
        let curated = |c: &DefaultCopyright| c.path == DEFAULT_LICENSING_SCOPE;
        let before = self.pack.default_copyrights.len();

        match curation.op {
            CopyrightOp::Insert => {
                let Some(copyright) = curation.copyright.as_deref() else {
                    return;
                };
                let exists = self
                    .pack
                    .default_copyrights
                    .iter()
                    .any(|c| curated(c) && c.copyright == copyright);
                if !exists {
                    self.pack.default_copyrights.push(DefaultCopyright {
                        copyright: copyright.to_owned(),
                        path: DEFAULT_LICENSING_SCOPE.to_owned(),
                    });
                    self.operations += 1;
                }
            }
            CopyrightOp::Delete => {
                if let Some(pattern) = curation.copyright.as_deref() {
                    self.pack
                        .default_copyrights
                        .retain(|c| !(curated(c) && wildcard_match(pattern, &c.copyright)));
                    self.operations += before - self.pack.default_copyrights.len();
                }
            }
            CopyrightOp::DeleteAll => {
                self.pack.default_copyrights.retain(|c| !curated(c));
                self.operations += before - self.pack.default_copyrights.len();
            }
        }
    }
}
