#![no_main]

use arbitrary::Arbitrary;
use clearance_curator::wildcard_match;
use libfuzzer_sys::fuzz_target;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    pattern: String,
    text: String,
}

fuzz_target!(|input: FuzzInput| {
    // 긴 '*' 연쇄에서 시간 폭증 방지
    if input.pattern.len() > 256 || input.text.len() > 1024 {
        return;
    }

    let matched = wildcard_match(&input.pattern, &input.text);

    // '*' 하나는 모든 문자열과 일치
    assert!(wildcard_match("*", &input.text));
    // '*' '?' 없는 패턴은 동일 문자열과만 일치
    if !input.pattern.contains(['*', '?']) {
        assert_eq!(matched, input.pattern == input.text);
    }
});
