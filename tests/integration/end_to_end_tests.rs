//! The concrete scenarios named in SPEC_FULL.md Section 8, driven entirely
//! through the public [`netex_validator::Validator`] surface.

use netex_validator::model::Severity;
use netex_validator::{Options, Validator};

use crate::common::test_helpers::{
    many_missing_name_lines, zip_archive, LINE_INVALID_TRANSPORT_MODE, LINE_MISSING_NAME,
    ROUTE_UNRESOLVED_REFERENCE, VALID_LINE,
};

fn validator() -> Validator {
    Validator::new(Options::default()).unwrap()
}

/// S1: a minimal, fully valid document produces no findings.
#[test]
fn s1_minimal_valid_document_is_valid() {
    let report = validator().validate_bytes("line.xml", VALID_LINE.as_bytes());
    assert!(report.is_valid());
    assert!(!report.entries.iter().any(|i| i.rule_code == "LINE_2"));
    assert!(!report.entries.iter().any(|i| i.rule_code == "LINE_4"));
}

/// S2: a Line missing its Name produces exactly one Error-severity LINE_2.
#[test]
fn s2_missing_name_reports_line_2() {
    let report = validator().validate_bytes("line.xml", LINE_MISSING_NAME.as_bytes());
    let line_2: Vec<_> = report.entries.iter().filter(|i| i.rule_code == "LINE_2").collect();
    assert_eq!(line_2.len(), 1);
    assert_eq!(line_2[0].severity, Severity::Error);
    assert_eq!(line_2[0].location.element_id.as_deref(), Some("TEST:Line:1"));
}

/// S3: an out-of-range TransportMode is flagged with the offending value in
/// the message.
#[test]
fn s3_invalid_transport_mode_is_reported() {
    let report = validator().validate_bytes("line.xml", LINE_INVALID_TRANSPORT_MODE.as_bytes());
    let issue = report
        .entries
        .iter()
        .find(|i| i.rule_code == "LINE_INVALID_TRANSPORT_MODE")
        .expect("expected LINE_INVALID_TRANSPORT_MODE issue");
    assert_eq!(issue.severity, Severity::Error);
    assert!(issue.message.contains("automobile"));
}

/// S4: an unresolved reference inside a single document yields NETEX_ID_5.
#[test]
fn s4_unresolved_reference_reports_netex_id_5() {
    let report = validator().validate_bytes("route.xml", ROUTE_UNRESOLVED_REFERENCE.as_bytes());
    let issue = report
        .entries
        .iter()
        .find(|i| i.rule_code == "NETEX_ID_5")
        .expect("expected NETEX_ID_5 issue");
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.location.element_id.as_deref(), Some("MISSING"));
}

/// S5: the same id defined in two non-common ZIP entries is flagged exactly
/// once as DUPLICATE_ID, only after both entries have been processed.
#[test]
fn s5_duplicate_id_across_zip_entries() {
    let a = r#"<Line id="TEST:Line:DUP" version="1"><Name>A</Name><TransportMode>bus</TransportMode></Line>"#;
    let b = r#"<Line id="TEST:Line:DUP" version="1"><Name>B</Name><TransportMode>bus</TransportMode></Line>"#;
    let archive = zip_archive(&[("a.xml", a), ("b.xml", b)]);

    let report = validator().validate_archive_bytes(&archive).unwrap();
    let duplicates: Vec<_> = report.entries.iter().filter(|i| i.rule_code == "DUPLICATE_ID").collect();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].location.element_id.as_deref(), Some("TEST:Line:DUP"));
}

/// S6: 1000 independent violations against a max_findings cap of 50 stop at
/// exactly 50 entries, every one a LINE_2.
#[test]
fn s6_max_findings_caps_the_report() {
    let options = Options::builder().max_findings(50).build();
    let validator = Validator::new(options).unwrap();

    let entries: Vec<(String, String)> = many_missing_name_lines(1000);
    let borrowed: Vec<(&str, &str)> = entries.iter().map(|(n, x)| (n.as_str(), x.as_str())).collect();
    let archive = zip_archive(&borrowed);

    let report = validator.validate_archive_bytes(&archive).unwrap();
    assert_eq!(report.entries.len(), 50);
    assert!(report.entries.iter().all(|i| i.rule_code == "LINE_2"));
}
