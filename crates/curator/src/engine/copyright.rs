//! 파일 저작권 큐레이션과 와일드카드 매칭

use clearance_core::model::{FileCopyright, FileLicensing};

use crate::rule::{CopyrightCuration, CopyrightOp, CurationFileItem};

use super::PackCuration;

impl PackCuration<'_> {
    pub(super) fn copyright(&mut self, item: &CurationFileItem, curation: &CopyrightCuration) {
        match curation.op {
            CopyrightOp::Insert => self.insert_copyright(item, curation),
            CopyrightOp::Delete => {
                if let Some(pattern) = curation.copyright.as_deref() {
                    self.remove_copyrights(item, |c| wildcard_match(pattern, c));
                }
            }
            CopyrightOp::DeleteAll => self.remove_copyrights(item, |_| true),
        }
    }

    fn insert_copyright(&mut self, item: &CurationFileItem, curation: &CopyrightCuration) {
        let Some(copyright) = curation.copyright.as_deref() else {
            return;
        };
        let scope = self.pack.relative_scope(&item.file_scope);
        let file = self
            .pack
            .file_licensings
            .entry(scope.clone())
            .or_insert_with(|| FileLicensing::new(scope.clone()));

        if file.copyrights.iter().any(|c| c.copyright == copyright) {
            return;
        }
        file.copyrights.push(FileCopyright::new(copyright));
        self.operations += 1;
    }

    fn remove_copyrights(&mut self, item: &CurationFileItem, hit: impl Fn(&str) -> bool) {
        for scope in self.matching_scopes(item) {
            let Some(file) = self.pack.file_licensings.get_mut(&scope) else {
                continue;
            };
            let before = file.copyrights.len();
            file.copyrights.retain(|c| !hit(c.copyright.as_str()));
            let removed = before - file.copyrights.len();
            if removed == 0 {
                continue;
            }

            self.operations += removed;
            let content = self.remove_if_empty(&scope);
            self.release(content);
            tracing::debug!(package = %self.pack.id, scope = %scope, removed, "copyrights deleted");
        }
    }
}

/// 저작권 문구 와일드카드 매칭
///
/// `*`는 임의 길이, `?`는 한 글자와 일치합니다. 그 외 문자는 그대로 비교하며,
/// `**`를 포함한 패턴은 어떤 문구와도 일치하지 않습니다.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    if pattern.contains("**") {
        return false;
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // 마지막 '*' 위치와 그 '*'가 소비하기 시작한 텍스트 위치
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, consumed)) => {
                    p = star + 1;
                    t = consumed + 1;
                    backtrack = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::LicenseArchive;
    use crate::engine::PackCuration;
    use crate::scope::FileScopeMatcher;
    use clearance_core::model::Pack;
    use clearance_core::types::PackageId;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn star_matches_any_suffix() {
        assert!(wildcard_match("ACME *", "ACME 2020 Corp"));
        assert!(!wildcard_match("ACME *", "Other Corp"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("Copyright * ACME", "Copyright (c) 2021 ACME"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(wildcard_match("20?? ACME", "2021 ACME"));
        assert!(!wildcard_match("20?? ACME", "201 ACME"));
    }

    #[test]
    fn double_star_never_matches() {
        assert!(!wildcard_match("**", "anything"));
        assert!(!wildcard_match("ACME **", "ACME Corp"));
        assert!(!wildcard_match("**", ""));
    }

    #[test]
    fn literal_pattern_requires_exact_text() {
        assert!(wildcard_match("Copyright ACME", "Copyright ACME"));
        assert!(!wildcard_match("Copyright ACME", "Copyright ACME Inc"));
    }

    proptest! {
        #[test]
        fn literal_text_matches_itself(text in "[a-zA-Z0-9 ,.()]{0,40}") {
            prop_assert!(wildcard_match(&text, &text));
        }

        #[test]
        fn prefix_star_matches_any_extension(prefix in "[a-z ]{0,10}", rest in "[a-z0-9 ]{0,20}") {
            let pattern = format!("{prefix}*");
            let text = format!("{prefix}{rest}");
            prop_assert!(wildcard_match(&pattern, &text));
        }

        #[test]
        fn consecutive_stars_always_fail(text in ".{0,30}", left in "[a-z]{0,5}") {
            let pattern = format!("{left}**");
            prop_assert!(!wildcard_match(&pattern, &text));
        }

        #[test]
        fn question_marks_match_by_length(text in "[a-z]{0,12}") {
            let pattern = "?".repeat(text.chars().count());
            prop_assert!(wildcard_match(&pattern, &text));
            let longer = format!("{pattern}?");
            prop_assert!(!wildcard_match(&longer, &text));
        }
    }

    fn item(scope: &str) -> CurationFileItem {
        CurationFileItem {
            file_scope: scope.to_owned(),
            matcher: FileScopeMatcher::new(scope).unwrap(),
            licenses: Vec::new(),
            copyrights: Vec::new(),
        }
    }

    fn curation(op: CopyrightOp, copyright: Option<&str>) -> CopyrightCuration {
        CopyrightCuration {
            op,
            copyright: copyright.map(str::to_owned),
            reason: None,
            comment: None,
        }
    }

    fn pack() -> Pack {
        let mut pack = Pack::new(PackageId::new("Maven", "g", "a", "1.0"));
        for scope in ["src/A.java", "src/B.java"] {
            let mut file = FileLicensing::new(scope);
            file.copyrights.push(FileCopyright::new("ACME 2020 Corp"));
            file.copyrights.push(FileCopyright::new("Other Corp"));
            pack.file_licensings.insert(scope.to_owned(), file);
        }
        pack
    }

    #[test]
    fn delete_with_pattern_across_glob() {
        let store = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        let mut cx = PackCuration::new(&mut pack, &archive, store.path());
        cx.copyright(&item("src/*.java"), &curation(CopyrightOp::Delete, Some("ACME *")));
        assert_eq!(cx.operations, 2);

        for file in pack.file_licensings.values() {
            assert_eq!(file.copyrights, vec![FileCopyright::new("Other Corp")]);
        }
    }

    #[test]
    fn delete_all_removes_emptied_files() {
        let store = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        let mut cx = PackCuration::new(&mut pack, &archive, store.path());
        cx.copyright(&item("src/A.java"), &curation(CopyrightOp::DeleteAll, None));

        assert!(!pack.file_licensings.contains_key("src/A.java"));
        assert!(pack.file_licensings.contains_key("src/B.java"));
    }

    #[test]
    fn insert_is_set_like() {
        let store = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let archive = LicenseArchive::open(staging.path()).unwrap();
        let mut pack = pack();
        let mut cx = PackCuration::new(&mut pack, &archive, store.path());
        let insert = curation(CopyrightOp::Insert, Some("Other Corp"));
        cx.copyright(&item("src/A.java"), &insert);
        cx.copyright(&item("src/New.java"), &insert);
        cx.copyright(&item("src/New.java"), &insert);
        assert_eq!(cx.operations, 1);

        assert_eq!(pack.file_licensings["src/A.java"].copyrights.len(), 2);
        assert_eq!(pack.file_licensings["src/New.java"].copyrights.len(), 1);
    }
}
