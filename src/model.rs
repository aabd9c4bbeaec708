//! Core value types shared across the validation engine: severities, rules,
//! issues, locations, and the report value returned to callers.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Ordered severity of a validation issue. Ordering matters: `is_valid()`
/// is defined as "no issue with severity >= Error".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ancestor-reconstructed location of a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLocation {
    pub file_name: String,
    pub line: Option<u32>,
    pub xpath: Option<String>,
    pub element_id: Option<String>,
}

impl DataLocation {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            line: None,
            xpath: None,
            element_id: None,
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_xpath(mut self, xpath: impl Into<String>) -> Self {
        self.xpath = Some(xpath.into());
        self
    }

    pub fn with_element_id(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }
}

/// An immutable rule, registered once per runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub code: String,
    pub name: String,
    pub message: String,
    pub severity: Severity,
    /// Present only for XPath-backed rules; absent for object-model rules,
    /// which render their own messages directly.
    pub expression: Option<String>,
}

impl ValidationRule {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            message: message.into(),
            severity,
            expression: None,
        }
    }

    pub fn xpath(
        code: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            message: message.into(),
            severity,
            expression: Some(expression.into()),
        }
    }
}

/// One concrete rule violation. Append-only: once constructed, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub rule_code: String,
    pub severity: Severity,
    pub location: DataLocation,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        rule_code: impl Into<String>,
        severity: Severity,
        location: DataLocation,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_code: rule_code.into(),
            severity,
            location,
            message: message.into(),
        }
    }

    pub fn from_rule(rule: &ValidationRule, location: DataLocation, message: impl Into<String>) -> Self {
        Self {
            rule_code: rule.code.clone(),
            severity: rule.severity,
            location,
            message: message.into(),
        }
    }
}

/// `(id, version, file)` triple recorded by the identifier extractor/store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdVersion {
    pub id: String,
    pub version: String,
    pub file: String,
}

impl IdVersion {
    pub fn new(id: impl Into<String>, version: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            file: file.into(),
        }
    }

    /// `version` is considered "unconstrained" for resolution-consistency
    /// purposes when empty or the literal token `any`.
    pub fn is_unconstrained_version(&self) -> bool {
        self.version.is_empty() || self.version == "any"
    }
}

/// The aggregate report value returned by every public `Validator` method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub codespace: String,
    pub report_id: String,
    pub creation_date: chrono::DateTime<chrono::Utc>,
    pub entries: Vec<ValidationIssue>,
    pub counts_per_rule: HashMap<String, usize>,
    pub files_processed: usize,
    #[serde(with = "duration_millis")]
    pub processing_time: Duration,
    pub error: Option<String>,
    pub cache_hit: bool,
    pub file_hash: Option<String>,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

impl ValidationReport {
    pub fn new(codespace: impl Into<String>) -> Self {
        Self {
            codespace: codespace.into(),
            report_id: uuid::Uuid::new_v4().to_string(),
            creation_date: chrono::Utc::now(),
            entries: Vec::new(),
            counts_per_rule: HashMap::new(),
            files_processed: 0,
            processing_time: Duration::new(0, 0),
            error: None,
            cache_hit: false,
            file_hash: None,
        }
    }

    pub fn with_error(codespace: impl Into<String>, error: impl Into<String>) -> Self {
        let mut report = Self::new(codespace);
        report.error = Some(error.into());
        report
    }

    /// "no issue with severity >= Error".
    pub fn is_valid(&self) -> bool {
        !self
            .entries
            .iter()
            .any(|issue| issue.severity >= Severity::Error)
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        *self.counts_per_rule.entry(issue.rule_code.clone()).or_insert(0) += 1;
        self.entries.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    pub fn merge(&mut self, mut other: ValidationReport) {
        self.files_processed += other.files_processed;
        self.entries.append(&mut other.entries);
        for (code, count) in other.counts_per_rule {
            *self.counts_per_rule.entry(code).or_insert(0) += count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_data_location_builder() {
        let location = DataLocation::new("file.xml")
            .with_line(5)
            .with_xpath("/Line[1]")
            .with_element_id("TEST:Line:1");
        assert_eq!(location.file_name, "file.xml");
        assert_eq!(location.line, Some(5));
        assert_eq!(location.xpath.as_deref(), Some("/Line[1]"));
        assert_eq!(location.element_id.as_deref(), Some("TEST:Line:1"));
    }

    #[test]
    fn test_is_valid_threshold() {
        let mut report = ValidationReport::new("Default");
        assert!(report.is_valid());

        report.push(ValidationIssue::new(
            "INVALID_ID_FORMAT",
            Severity::Warning,
            DataLocation::new("a.xml"),
            "warn",
        ));
        assert!(report.is_valid());

        report.push(ValidationIssue::new(
            "NETEX_ID_5",
            Severity::Error,
            DataLocation::new("a.xml"),
            "error",
        ));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_counts_per_rule() {
        let mut report = ValidationReport::new("Default");
        report.push(ValidationIssue::new(
            "LINE_2",
            Severity::Error,
            DataLocation::new("a.xml"),
            "m1",
        ));
        report.push(ValidationIssue::new(
            "LINE_2",
            Severity::Error,
            DataLocation::new("a.xml"),
            "m2",
        ));
        assert_eq!(report.counts_per_rule.get("LINE_2"), Some(&2));
    }

    #[test]
    fn test_id_version_unconstrained() {
        assert!(IdVersion::new("id", "", "f").is_unconstrained_version());
        assert!(IdVersion::new("id", "any", "f").is_unconstrained_version());
        assert!(!IdVersion::new("id", "1", "f").is_unconstrained_version());
    }

    #[test]
    fn test_merge_accumulates_counts_and_files() {
        let mut a = ValidationReport::new("Default");
        a.files_processed = 1;
        a.push(ValidationIssue::new(
            "LINE_2",
            Severity::Error,
            DataLocation::new("a.xml"),
            "m",
        ));

        let mut b = ValidationReport::new("Default");
        b.files_processed = 1;
        b.push(ValidationIssue::new(
            "LINE_2",
            Severity::Error,
            DataLocation::new("b.xml"),
            "m",
        ));

        a.merge(b);
        assert_eq!(a.files_processed, 2);
        assert_eq!(a.entries.len(), 2);
        assert_eq!(a.counts_per_rule.get("LINE_2"), Some(&2));
    }
}
