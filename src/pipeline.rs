//! The per-file pipeline (Section 4.1): cache lookup, schema validation,
//! parse, identifier extraction, XPath rules, object-model rules, strictly
//! sequential and short-circuiting on the first Error-or-higher issue or
//! the global findings cap.

use std::sync::Arc;
use std::time::Instant;

use xee_xpath::{DocumentHandle, Documents};

use crate::cache::{content_hash, ResultCache};
use crate::identifiers::{extract_identifiers, IdentifierStore};
use crate::logger::Logger;
use crate::model::{DataLocation, Severity, ValidationIssue, ValidationReport};
use crate::object_model::validators::{validate_lines, validate_network_consistency, validate_service_journeys};
use crate::object_model::ObjectContext;
use crate::options::Options;
use crate::schema::SchemaValidator;
use crate::xpath::XPathEvaluator;

/// Parses `xml` once via `xee_xpath::Documents`, the single tree shared by
/// identifier extraction, XPath evaluation, and object-model construction.
fn load_document(file_name: &str, xml: &str) -> Result<(Documents, DocumentHandle), String> {
    let mut documents = Documents::new();
    let handle = documents
        .add_string(file_name.to_string(), xml.to_string())
        .map_err(|err| err.to_string())?;
    Ok((documents, handle))
}

fn cap_reached(report: &ValidationReport, max_findings: usize) -> bool {
    max_findings > 0 && report.entries.len() >= max_findings
}

/// Applies `rule_overrides`/`severity_overrides`, then appends to `report`
/// if the global cap (`max_findings`, 0 = unlimited) isn't already reached.
/// Returns whether the issue was appended.
fn try_push(report: &mut ValidationReport, mut issue: ValidationIssue, options: &Options) -> bool {
    if !options.rule_enabled(&issue.rule_code) {
        return false;
    }
    if cap_reached(report, options.max_findings) {
        return false;
    }
    issue.severity = options.effective_severity(&issue.rule_code, issue.severity);
    report.push(issue);
    true
}

fn has_error_or_higher(report: &ValidationReport, since: usize) -> bool {
    report.entries[since..].iter().any(|issue| issue.severity >= Severity::Error)
}

/// Orchestrates the sequential per-file stages sharing the dataset-wide
/// collaborators (cache, identifier store, schema validator, logger).
pub struct PerFilePipeline {
    pub options: Arc<Options>,
    pub schema_validator: Arc<dyn SchemaValidator>,
    pub xpath_evaluator: Arc<XPathEvaluator>,
    pub cache: Option<Arc<ResultCache>>,
    pub identifier_store: Arc<IdentifierStore>,
    pub logger: Arc<dyn Logger>,
}

impl PerFilePipeline {
    pub fn run(&self, file_name: &str, bytes: &[u8]) -> ValidationReport {
        let start = Instant::now();

        let hash = if self.cache.is_some() {
            Some(content_hash(bytes))
        } else {
            None
        };

        if let (Some(cache), Some(hash)) = (&self.cache, &hash) {
            if let Some(mut cached) = cache.get(hash) {
                cached.cache_hit = true;
                return cached;
            }
        }

        let mut report = ValidationReport::new(self.options.codespace.clone());
        report.files_processed = 1;
        report.file_hash = hash.clone();

        if !self.options.skip_schema {
            let structural_errors = self.schema_validator.validate(file_name, bytes);
            let limit = self.options.max_schema_errors;
            let before = report.entries.len();
            for (i, error) in structural_errors.into_iter().enumerate() {
                if limit > 0 && i >= limit {
                    break;
                }
                let mut location = DataLocation::new(file_name.to_string());
                if let Some(line) = error.line {
                    location = location.with_line(line);
                }
                try_push(
                    &mut report,
                    ValidationIssue::new("SCHEMA_ERROR", Severity::Error, location, error.message),
                    &self.options,
                );
            }
            if cap_reached(&report, self.options.max_findings) || has_error_or_higher(&report, before) {
                report.processing_time = start.elapsed();
                self.maybe_cache(hash, &report);
                return report;
            }
        }

        let xml = match std::str::from_utf8(bytes) {
            Ok(xml) => xml,
            Err(_) => {
                report.push(ValidationIssue::new(
                    "SCHEMA_ERROR",
                    Severity::Error,
                    DataLocation::new(file_name.to_string()),
                    format!("'{file_name}' is not valid UTF-8"),
                ));
                report.processing_time = start.elapsed();
                self.maybe_cache(hash, &report);
                return report;
            }
        };

        let (mut documents, doc_handle) = match load_document(file_name, xml) {
            Ok(loaded) => loaded,
            Err(reason) => {
                report.push(ValidationIssue::new(
                    "SCHEMA_ERROR",
                    Severity::Error,
                    DataLocation::new(file_name.to_string()),
                    format!("'{file_name}' could not be parsed: {reason}"),
                ));
                report.processing_time = start.elapsed();
                self.maybe_cache(hash, &report);
                return report;
            }
        };

        // `document_node` returns the parsed tree's root element as an
        // `xot::Node`, the handle identifier extraction and object-model
        // indexing need alongside the `&Xot` from `documents.xot()` so they
        // walk the exact same tree the XPath evaluator just queried.
        let root = documents.document_node(doc_handle);
        {
            let xot = documents.xot();
            let extracted = extract_identifiers(xot, root, file_name);
            for def in extracted.definitions {
                if let Err(conflict) = self.identifier_store.add_id(&def.id, &def.version, &def.file) {
                    self.logger.warn(
                        "duplicate id with conflicting version in same file",
                        vec![("id", conflict.id), ("file", conflict.file)],
                    );
                }
            }
            for reference in extracted.references {
                self.identifier_store
                    .add_reference(&reference.id, &reference.version, &reference.file);
            }
            if file_name
                .rsplit('/')
                .next()
                .map(|name| name.starts_with('_'))
                .unwrap_or(false)
            {
                self.identifier_store.mark_as_common_file(file_name);
            }
        }

        if !self.options.skip_rules {
            let before = report.entries.len();
            let xpath_issues = self
                .xpath_evaluator
                .evaluate(&mut documents, doc_handle, file_name, self.logger.as_ref());
            for issue in xpath_issues {
                if !try_push(&mut report, issue, &self.options) {
                    break;
                }
            }
            if cap_reached(&report, self.options.max_findings) || has_error_or_higher(&report, before) {
                report.processing_time = start.elapsed();
                self.maybe_cache(hash, &report);
                return report;
            }

            let xot = documents.xot();
            let ctx = ObjectContext::build(xot, root);
            let mut object_issues = Vec::new();
            object_issues.extend(ctx.frame_collisions(file_name));
            object_issues.extend(validate_lines(xot, &ctx, file_name));
            object_issues.extend(validate_network_consistency(xot, &ctx, file_name));
            object_issues.extend(validate_service_journeys(xot, &ctx, file_name));
            for issue in object_issues {
                try_push(&mut report, issue, &self.options);
            }
        }

        report.processing_time = start.elapsed();
        self.maybe_cache(hash, &report);
        report
    }

    fn maybe_cache(&self, hash: Option<String>, report: &ValidationReport) {
        if let (Some(cache), Some(hash)) = (&self.cache, hash) {
            let approx_bytes = approx_report_bytes(report);
            cache.set(hash, report.clone(), approx_bytes, self.logger.as_ref());
        }
    }
}

/// `approxBytes(report) ≈ sum(len(issue.message) + constant overhead)`.
fn approx_report_bytes(report: &ValidationReport) -> u64 {
    const OVERHEAD_PER_ISSUE: u64 = 96;
    report
        .entries
        .iter()
        .map(|issue| issue.message.len() as u64 + issue.location.file_name.len() as u64 + OVERHEAD_PER_ISSUE)
        .sum::<u64>()
        + 256
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::test_support::RecordingLogger;
    use crate::rules::default_rule_catalogue;
    use crate::schema::StructuralError;

    struct AlwaysPasses;
    impl SchemaValidator for AlwaysPasses {
        fn validate(&self, _file_name: &str, _bytes: &[u8]) -> Vec<StructuralError> {
            Vec::new()
        }
    }

    struct AlwaysFails;
    impl SchemaValidator for AlwaysFails {
        fn validate(&self, _file_name: &str, _bytes: &[u8]) -> Vec<StructuralError> {
            vec![StructuralError::new("not schema-valid").with_line(3)]
        }
    }

    fn pipeline(schema: Arc<dyn SchemaValidator>, options: Options) -> PerFilePipeline {
        let logger: Arc<dyn Logger> = Arc::new(RecordingLogger::default());
        let evaluator = Arc::new(XPathEvaluator::new(default_rule_catalogue(), logger.as_ref()));
        PerFilePipeline {
            options: Arc::new(options),
            schema_validator: schema,
            xpath_evaluator: evaluator,
            cache: None,
            identifier_store: Arc::new(IdentifierStore::new()),
            logger,
        }
    }

    const VALID_LINE: &str = r#"<Line id="TEST:Line:1" version="1">
        <Name>Line One</Name>
        <TransportMode>bus</TransportMode>
    </Line>"#;

    #[test]
    fn test_schema_error_short_circuits_before_parsing() {
        let pipeline = pipeline(Arc::new(AlwaysFails), Options::default());
        let report = pipeline.run("a.xml", VALID_LINE.as_bytes());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].rule_code, "SCHEMA_ERROR");
        assert!(!report.is_valid());
    }

    #[test]
    fn test_malformed_utf8_produces_schema_error() {
        let pipeline = pipeline(Arc::new(AlwaysPasses), Options::default());
        let bytes: &[u8] = &[0xff, 0xfe, 0x00];
        let report = pipeline.run("a.xml", bytes);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].rule_code, "SCHEMA_ERROR");
    }

    #[test]
    fn test_valid_line_produces_no_issues() {
        let pipeline = pipeline(Arc::new(AlwaysPasses), Options::default());
        let report = pipeline.run("a.xml", VALID_LINE.as_bytes());
        assert!(report.is_valid());
        assert_eq!(report.files_processed, 1);
    }

    #[test]
    fn test_line_missing_name_is_reported() {
        let xml = r#"<Line id="TEST:Line:2" version="1"><TransportMode>bus</TransportMode></Line>"#;
        let pipeline = pipeline(Arc::new(AlwaysPasses), Options::default());
        let report = pipeline.run("a.xml", xml.as_bytes());
        assert!(report.entries.iter().any(|i| i.rule_code == "LINE_2"));
    }

    #[test]
    fn test_skip_rules_suppresses_xpath_and_object_model_stages() {
        let xml = r#"<Line id="TEST:Line:3" version="1"></Line>"#;
        let options = Options::builder().skip_rules(true).build();
        let pipeline = pipeline(Arc::new(AlwaysPasses), options);
        let report = pipeline.run("a.xml", xml.as_bytes());
        assert!(report.is_valid());
    }

    #[test]
    fn test_rule_override_disables_rule() {
        let xml = r#"<Line id="TEST:Line:4" version="1"><TransportMode>bus</TransportMode></Line>"#;
        let options = Options::builder().rule_override("LINE_2", false).build();
        let pipeline = pipeline(Arc::new(AlwaysPasses), options);
        let report = pipeline.run("a.xml", xml.as_bytes());
        assert!(!report.entries.iter().any(|i| i.rule_code == "LINE_2"));
    }

    #[test]
    fn test_severity_override_downgrades_error_to_warning() {
        let xml = r#"<Line id="TEST:Line:5" version="1"><TransportMode>bus</TransportMode></Line>"#;
        let options = Options::builder()
            .severity_override("LINE_2", Severity::Warning)
            .build();
        let pipeline = pipeline(Arc::new(AlwaysPasses), options);
        let report = pipeline.run("a.xml", xml.as_bytes());
        assert!(report.is_valid());
        assert!(report.entries.iter().any(|i| i.rule_code == "LINE_2" && i.severity == Severity::Warning));
    }

    #[test]
    fn test_cache_hit_skips_revalidation() {
        let cache = Arc::new(ResultCache::new(10, 1024 * 1024, std::time::Duration::from_secs(60)));
        let options = Options::builder().enable_cache(true).build();
        let mut harness = pipeline(Arc::new(AlwaysPasses), options);
        harness.cache = Some(cache.clone());

        let first = harness.run("a.xml", VALID_LINE.as_bytes());
        assert!(!first.cache_hit);

        let second = harness.run("a.xml", VALID_LINE.as_bytes());
        assert!(second.cache_hit);
    }

    #[test]
    fn test_max_findings_cap_truncates_issues() {
        let xml = r#"<Frame>
            <Line id="L1"></Line>
            <Line id="L2"></Line>
            <Line id="L3"></Line>
        </Frame>"#;
        let options = Options::builder().max_findings(1).build();
        let pipeline = pipeline(Arc::new(AlwaysPasses), options);
        let report = pipeline.run("a.xml", xml.as_bytes());
        assert_eq!(report.entries.len(), 1);
    }
}
