#![no_main]

use arbitrary::Arbitrary;
use clearance_curator::IvyRange;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    range: String,
    versions: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(range) = IvyRange::parse(&input.range) else {
        return;
    };
    for version in input.versions.iter().take(8) {
        let _ = range.matches(version);
    }
});
