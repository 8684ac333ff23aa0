use promptic_core::test_runner;
use std::path::Path;

#[test]
fn review_cases_pass() {
    let cases = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../tests/cases"));
    let report = test_runner::run(cases);
    assert!(report.succeeded(), "{}", report.log);
    assert!(report.total >= 9);
}
