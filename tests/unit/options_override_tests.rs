//! Black-box checks that `Options` overrides actually change validation
//! outcomes through the public `Validator` surface, not just the raw struct.

use netex_validator::model::Severity;
use netex_validator::{Options, Validator};

use crate::common::test_helpers::LINE_MISSING_NAME;

#[test]
fn disabling_a_rule_suppresses_its_findings() {
    let options = Options::builder().rule_override("LINE_2", false).build();
    let validator = Validator::new(options).unwrap();
    let report = validator.validate_bytes("line.xml", LINE_MISSING_NAME.as_bytes());
    assert!(!report.entries.iter().any(|i| i.rule_code == "LINE_2"));
}

#[test]
fn severity_override_downgrades_a_finding_below_error() {
    let options = Options::builder().severity_override("LINE_2", Severity::Warning).build();
    let validator = Validator::new(options).unwrap();
    let report = validator.validate_bytes("line.xml", LINE_MISSING_NAME.as_bytes());
    let issue = report.entries.iter().find(|i| i.rule_code == "LINE_2").unwrap();
    assert_eq!(issue.severity, Severity::Warning);
    assert!(report.is_valid());
}

#[test]
fn invalid_options_are_rejected_at_construction() {
    let options = Options::builder().concurrent_files(0).build();
    assert!(Validator::new(options).is_err());
}
