#![no_main]

use std::path::Path;

use clearance_curator::rule::loader::parse_yaml;
use clearance_curator::rule::validate_rule;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(yaml_str) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(raw_rules) = parse_yaml(yaml_str, "fuzz-input.yml") else {
        return;
    };

    // 파싱된 규칙은 검증 단계에서도 패닉 없이 수락/거부되어야 함
    for raw in raw_rules.iter().take(16) {
        let _ = validate_rule(raw, Path::new("/nonexistent"), Path::new("fuzz-input.yml"));
    }
});
