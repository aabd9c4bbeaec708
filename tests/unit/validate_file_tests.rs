//! Black-box check of [`netex_validator::Validator::validate_file`] against a
//! real file on disk, as opposed to the in-memory `validate_bytes` path
//! exercised everywhere else.

use std::io::Write;

use netex_validator::{Options, Validator};
use tempfile::NamedTempFile;

use crate::common::test_helpers::VALID_LINE;

#[test]
fn validate_file_reads_and_validates_from_disk() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(VALID_LINE.as_bytes()).unwrap();

    let validator = Validator::new(Options::default()).unwrap();
    let report = validator.validate_file(file.path()).unwrap();
    assert!(report.is_valid());
}

#[test]
fn validate_file_surfaces_io_errors_for_missing_paths() {
    let validator = Validator::new(Options::default()).unwrap();
    let result = validator.validate_file("/nonexistent/path/does-not-exist.xml");
    assert!(result.is_err());
}
