//! IVY 버전 범위 -- 규칙 ID의 버전 부분 매칭
//!
//! 지원 형식:
//!
//! | 형식 | 의미 |
//! |------|------|
//! | (빈 문자열) | 모든 버전 |
//! | `1.2.3` | 정확히 일치 |
//! | `1.2.+` | `1.2.`로 시작하는 모든 버전 |
//! | `[1.0,2.0]` | `1.0 <= v <= 2.0` |
//! | `[1.0,2.0)` / `[1.0,2.0[` | `1.0 <= v < 2.0` |
//! | `]1.0,2.0]` / `(1.0,2.0]` | `1.0 < v <= 2.0` |
//! | `[1.0,)` | `v >= 1.0` |
//! | `(,2.0]` | `v <= 2.0` |
//!
//! 양쪽이 SemVer로 파싱되면 `semver`로 비교하고, 아니면 구간별로 비교합니다
//! (숫자 구간은 숫자로, 나머지는 문자열로).

use std::cmp::Ordering;
use std::fmt;

use crate::error::CuratorError;

/// 범위 경계
#[derive(Debug, Clone, PartialEq, Eq)]
struct Bound {
    version: String,
    inclusive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RangeKind {
    Any,
    Exact(String),
    Prefix(String),
    Interval {
        lower: Option<Bound>,
        upper: Option<Bound>,
    },
}

/// 파싱된 IVY 버전 범위
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IvyRange {
    raw: String,
    kind: RangeKind,
}

impl IvyRange {
    /// 범위 문자열을 파싱합니다.
    pub fn parse(raw: &str) -> Result<Self, CuratorError> {
        let trimmed = raw.trim();
        let err = |reason: &str| CuratorError::VersionRange {
            range: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let kind = if trimmed.is_empty() {
            RangeKind::Any
        } else if let Some(first) = trimmed.chars().next().filter(|c| matches!(c, '[' | ']' | '('))
        {
            let last = trimmed.chars().last().unwrap_or(first);
            let upper_inclusive = match last {
                ']' => true,
                '[' | ')' => false,
                _ => return Err(err("missing closing bracket")),
            };
            if trimmed.len() < 2 {
                return Err(err("missing closing bracket"));
            }
            let inner = &trimmed[1..trimmed.len() - 1];
            let (low, high) = inner
                .split_once(',')
                .ok_or_else(|| err("interval requires exactly one ','"))?;
            if high.contains(',') {
                return Err(err("interval requires exactly one ','"));
            }
            let (low, high) = (low.trim(), high.trim());
            if low.is_empty() && high.is_empty() {
                return Err(err("interval requires at least one bound"));
            }
            if [low, high].iter().any(|v| v.contains(is_bracket)) {
                return Err(err("nested brackets are not allowed"));
            }
            let lower = (!low.is_empty()).then(|| Bound {
                version: low.to_owned(),
                inclusive: first == '[',
            });
            let upper = (!high.is_empty()).then(|| Bound {
                version: high.to_owned(),
                inclusive: upper_inclusive,
            });
            if let (Some(l), Some(u)) = (&lower, &upper) {
                match compare_versions(&l.version, &u.version) {
                    Ordering::Greater => return Err(err("lower bound exceeds upper bound")),
                    Ordering::Equal if !(l.inclusive && u.inclusive) => {
                        return Err(err("empty interval"));
                    }
                    _ => {}
                }
            }
            RangeKind::Interval { lower, upper }
        } else if let Some(prefix) = trimmed.strip_suffix('+') {
            if prefix.contains(is_bracket) || prefix.contains([',', '+']) {
                return Err(err("invalid prefix range"));
            }
            if prefix.is_empty() {
                RangeKind::Any
            } else {
                RangeKind::Prefix(prefix.to_owned())
            }
        } else if trimmed.contains(is_bracket) || trimmed.contains(',') {
            return Err(err("unbalanced interval"));
        } else {
            RangeKind::Exact(trimmed.to_owned())
        };

        Ok(Self {
            raw: raw.to_owned(),
            kind,
        })
    }

    /// 버전이 범위에 포함되는지 확인합니다.
    pub fn matches(&self, version: &str) -> bool {
        match &self.kind {
            RangeKind::Any => true,
            RangeKind::Exact(exact) => compare_versions(version, exact) == Ordering::Equal,
            RangeKind::Prefix(prefix) => version.starts_with(prefix.as_str()),
            RangeKind::Interval { lower, upper } => {
                let above = lower.as_ref().is_none_or(|b| {
                    match compare_versions(version, &b.version) {
                        Ordering::Greater => true,
                        Ordering::Equal => b.inclusive,
                        Ordering::Less => false,
                    }
                });
                let below = upper.as_ref().is_none_or(|b| {
                    match compare_versions(version, &b.version) {
                        Ordering::Less => true,
                        Ordering::Equal => b.inclusive,
                        Ordering::Greater => false,
                    }
                });
                above && below
            }
        }
    }

    /// 모든 버전과 일치하는 범위인지 확인합니다.
    pub fn is_any(&self) -> bool {
        self.kind == RangeKind::Any
    }
}

impl fmt::Display for IvyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_bracket(c: char) -> bool {
    matches!(c, '[' | ']' | '(' | ')')
}

/// 두 버전 문자열을 비교합니다.
///
/// 둘 다 SemVer면 SemVer 규칙으로, 아니면 `.`/`-`/`_` 구간별로 비교합니다.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if let (Ok(va), Ok(vb)) = (semver::Version::parse(a), semver::Version::parse(b)) {
        return va.cmp(&vb);
    }

    let split = |s: &str| -> Vec<String> {
        s.split(['.', '-', '_'])
            .map(str::to_owned)
            .collect::<Vec<_>>()
    };
    let (sa, sb) = (split(a), split(b));
    for (x, y) in sa.iter().zip(sb.iter()) {
        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(nx), Ok(ny)) => nx.cmp(&ny),
            _ => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    sa.len().cmp(&sb.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn range(s: &str) -> IvyRange {
        IvyRange::parse(s).unwrap()
    }

    #[test]
    fn empty_matches_everything() {
        let r = range("");
        assert!(r.is_any());
        assert!(r.matches("0.0.1"));
        assert!(r.matches("whatever"));
    }

    #[test]
    fn exact_version() {
        let r = range("2.11.0");
        assert!(r.matches("2.11.0"));
        assert!(!r.matches("2.11.1"));
    }

    #[test]
    fn prefix_version() {
        let r = range("1.2.+");
        assert!(r.matches("1.2.0"));
        assert!(r.matches("1.2.99"));
        assert!(!r.matches("1.3.0"));
        assert!(range("+").is_any());
    }

    #[test]
    fn closed_interval() {
        let r = range("[1.0,2.0]");
        assert!(r.matches("1.0"));
        assert!(r.matches("1.5.3"));
        assert!(r.matches("2.0"));
        assert!(!r.matches("2.0.1"));
        assert!(!r.matches("0.9"));
    }

    #[test]
    fn half_open_interval_both_notations() {
        for s in ["[1.0,2.0)", "[1.0,2.0["] {
            let r = range(s);
            assert!(r.matches("1.0"), "{s}");
            assert!(r.matches("1.9.9"), "{s}");
            assert!(!r.matches("2.0"), "{s}");
        }
    }

    #[test]
    fn exclusive_lower_both_notations() {
        for s in ["]1.0,2.0]", "(1.0,2.0]"] {
            let r = range(s);
            assert!(!r.matches("1.0"), "{s}");
            assert!(r.matches("1.0.1"), "{s}");
            assert!(r.matches("2.0"), "{s}");
        }
    }

    #[test]
    fn open_ended_intervals() {
        let upper_only = range("(,2.0]");
        assert!(upper_only.matches("0.1"));
        assert!(upper_only.matches("2.0"));
        assert!(!upper_only.matches("2.1"));

        let lower_only = range("[1.0,)");
        assert!(lower_only.matches("1.0"));
        assert!(lower_only.matches("99.0"));
        assert!(!lower_only.matches("0.9"));
    }

    #[test]
    fn semver_comparison_when_both_parse() {
        let r = range("[1.0.0,1.10.0)");
        assert!(r.matches("1.9.0"));
        assert!(!r.matches("1.10.0"));
        assert!(!r.matches("1.0.0-alpha"));
    }

    #[test]
    fn segment_comparison_fallback() {
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("2.0.RELEASE", "2.0.RELEASE"), Ordering::Equal);
        assert_eq!(compare_versions("1.0-beta", "1.0-alpha"), Ordering::Greater);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        for s in [
            "[1.0,2.0",
            "[,]",
            "[1.0]",
            "[2.0,1.0]",
            "[1.0,1.0)",
            "1.0,2.0",
            "[1.0,2.0,3.0]",
            "1.0)",
            "[[1.0,2.0]",
        ] {
            assert!(IvyRange::parse(s).is_err(), "{s} should be rejected");
        }
    }

    #[test]
    fn display_echoes_raw() {
        assert_eq!(range("[1.0,2.0)").to_string(), "[1.0,2.0)");
    }

    proptest! {
        #[test]
        fn closed_interval_contains_its_bounds(a in 0u32..50, b in 0u32..50, c in 0u32..50) {
            let (lo, hi) = (a.min(b), a.max(b) + 1);
            let r = range(&format!("[{lo}.{c},{hi}.{c}]"));
            let lo_v = format!("{lo}.{c}");
            let hi_v = format!("{hi}.{c}");
            let above_v = format!("{}.{c}", hi + 1);
            prop_assert!(r.matches(&lo_v));
            prop_assert!(r.matches(&hi_v));
            prop_assert!(!r.matches(&above_v));
        }

        #[test]
        fn exact_range_matches_only_itself(major in 0u32..20, minor in 0u32..20, patch in 0u32..20) {
            let version = format!("{major}.{minor}.{patch}");
            let r = range(&version);
            prop_assert!(r.matches(&version));
            let next = format!("{major}.{minor}.{}", patch + 1);
            prop_assert!(!r.matches(&next));
        }

        #[test]
        fn compare_is_antisymmetric(a in "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}", b in "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}") {
            prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
        }

        #[test]
        fn parse_never_panics(raw in ".{0,24}") {
            let _ = IvyRange::parse(&raw);
        }
    }
}
