//! Black-box checks of the `SchemaValidator` plug-point (Section 6): a
//! caller-supplied implementation is consulted before any rule runs, and a
//! structural failure short-circuits the rest of the pipeline.

use std::sync::Arc;

use netex_validator::model::Severity;
use netex_validator::{SchemaValidator, StructuralError, Validator};

use crate::common::test_helpers::VALID_LINE;

#[derive(Debug)]
struct RejectEverything;

impl SchemaValidator for RejectEverything {
    fn validate(&self, _file_name: &str, _bytes: &[u8]) -> Vec<StructuralError> {
        vec![StructuralError::new("document does not conform to the profile").with_line(1)]
    }
}

#[test]
fn custom_schema_validator_short_circuits_rule_evaluation() {
    let validator = Validator::builder().schema_validator(Arc::new(RejectEverything)).build().unwrap();
    let report = validator.validate_bytes("line.xml", VALID_LINE.as_bytes());

    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].rule_code, "SCHEMA_ERROR");
    assert_eq!(report.entries[0].severity, Severity::Error);
    assert!(!report.is_valid());
}
