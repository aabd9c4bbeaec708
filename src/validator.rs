//! The public entry point (Section 4): wires the cache, identifier store,
//! XPath evaluator, schema validator, and logger into the per-file pipeline
//! and dataset runner, and exposes the three validation surfaces the rest of
//! the crate is built to serve.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::cache::ResultCache;
use crate::dataset::{default_external_validator, finalize_cross_file_checks, run_archive};
use crate::error::Result;
use crate::identifiers::{ExternalReferenceValidator, IdentifierStore};
use crate::logger::{default_logger, Logger};
use crate::model::ValidationReport;
use crate::options::Options;
use crate::pipeline::PerFilePipeline;
use crate::rules::default_rule_catalogue;
use crate::schema::{LibXml2SchemaValidator, SchemaValidator, StructuralError};

/// Embedded default NetEX XSD entry point. A real deployment supplies its own
/// compiled schema through [`ValidatorBuilder::schema_validator`]; this
/// placeholder keeps `Validator::new` usable without external schema
/// acquisition, which is explicitly out of the engine's core (Section 6).
const PERMISSIVE_SCHEMA: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Line" type="xs:anyType"/>
  <xs:element name="Route" type="xs:anyType"/>
  <xs:element name="ServiceJourney" type="xs:anyType"/>
  <xs:element name="CompositeFrame" type="xs:anyType"/>
</xs:schema>
"#;

fn default_schema_validator() -> Arc<dyn SchemaValidator> {
    LibXml2SchemaValidator::parse(PERMISSIVE_SCHEMA)
        .map(|validator| Arc::new(validator) as Arc<dyn SchemaValidator>)
        .unwrap_or_else(|_| Arc::new(NoopSchemaValidator))
}

/// The validation engine. Construct through [`Validator::new`] (sensible
/// defaults: the bundled libxml2-backed schema validator, the default rule
/// catalogue, no caching) or [`Validator::builder`] for full control over
/// collaborators.
pub struct Validator {
    options: Arc<Options>,
    schema_validator: Arc<dyn SchemaValidator>,
    external_validator: Arc<dyn ExternalReferenceValidator>,
    logger: Arc<dyn Logger>,
}

impl Validator {
    /// Builds a validator with the bundled collaborators. Fails only if
    /// `options` itself is invalid (Section 6's construction-time check).
    pub fn new(options: Options) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options: Arc::new(options),
            schema_validator: default_schema_validator(),
            external_validator: default_external_validator(),
            logger: default_logger(),
        })
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    fn new_pipeline(&self, cache: Option<Arc<ResultCache>>, identifier_store: Arc<IdentifierStore>) -> PerFilePipeline {
        let evaluator = Arc::new(crate::xpath::XPathEvaluator::new(
            default_rule_catalogue(),
            self.logger.as_ref(),
        ));
        PerFilePipeline {
            options: Arc::clone(&self.options),
            schema_validator: Arc::clone(&self.schema_validator),
            xpath_evaluator: evaluator,
            cache,
            identifier_store,
            logger: Arc::clone(&self.logger),
        }
    }

    fn new_cache(&self) -> Option<Arc<ResultCache>> {
        if !self.options.enable_cache {
            return None;
        }
        Some(Arc::new(ResultCache::new(
            self.options.cache_max_entries,
            self.options.cache_max_bytes,
            self.options.cache_ttl,
        )))
    }

    /// Validates a single in-memory NetEX document. Cross-file checks that
    /// only make sense across a dataset (duplicate-id, version-mismatch
    /// against another file, external references) don't run here since this
    /// document has no siblings; format and per-id version checks still do.
    pub fn validate_bytes(&self, file_name: &str, bytes: &[u8]) -> ValidationReport {
        let cache = self.new_cache();
        let identifier_store = Arc::new(IdentifierStore::new());
        let pipeline = self.new_pipeline(cache, identifier_store.clone());
        let mut report = pipeline.run(file_name, bytes);

        let cross_file_issues = finalize_cross_file_checks(
            &identifier_store,
            self.external_validator.as_ref(),
            &self.options,
        );
        for issue in cross_file_issues {
            if self.options.max_findings > 0 && report.entries.len() >= self.options.max_findings {
                break;
            }
            report.push(issue);
        }
        report
    }

    /// Reads and validates a single NetEX file from disk.
    pub fn validate_file(&self, path: impl AsRef<Path>) -> Result<ValidationReport> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let file_name = path.to_string_lossy().to_string();
        Ok(self.validate_bytes(&file_name, &bytes))
    }

    /// Reads and validates every `.xml` entry inside a ZIP archive,
    /// running cross-file identifier checks once every entry has been
    /// processed (Section 4.7).
    pub fn validate_archive(&self, path: impl AsRef<Path>) -> Result<ValidationReport> {
        let archive_bytes = fs::read(path.as_ref())?;
        self.validate_archive_bytes(&archive_bytes)
    }

    /// Same as [`Validator::validate_archive`] but from in-memory bytes.
    pub fn validate_archive_bytes(&self, archive_bytes: &[u8]) -> Result<ValidationReport> {
        let cache = self.new_cache();
        let identifier_store = Arc::new(IdentifierStore::new());
        let pipeline = Arc::new(self.new_pipeline(cache, identifier_store.clone()));
        run_archive(
            archive_bytes,
            pipeline,
            identifier_store,
            Arc::clone(&self.external_validator),
            &self.options,
            self.logger.as_ref(),
        )
    }
}

/// A [`SchemaValidator`] that accepts everything, used only as a last-resort
/// fallback if the bundled placeholder schema somehow fails to parse at
/// construction time, so `Validator::new` never needs to return an error for
/// a reason the caller can't act on.
#[derive(Debug)]
struct NoopSchemaValidator;

impl SchemaValidator for NoopSchemaValidator {
    fn validate(&self, _file_name: &str, _bytes: &[u8]) -> Vec<StructuralError> {
        Vec::new()
    }
}

/// Full control over every collaborator (Section 6: schema validator,
/// external-reference validator, logger, rule catalogue are all injectable).
#[derive(Default)]
pub struct ValidatorBuilder {
    options: Option<Options>,
    schema_validator: Option<Arc<dyn SchemaValidator>>,
    external_validator: Option<Arc<dyn ExternalReferenceValidator>>,
    logger: Option<Arc<dyn Logger>>,
}

impl ValidatorBuilder {
    pub fn options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    pub fn schema_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.schema_validator = Some(validator);
        self
    }

    pub fn external_validator(mut self, validator: Arc<dyn ExternalReferenceValidator>) -> Self {
        self.external_validator = Some(validator);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<Validator> {
        let options = self.options.unwrap_or_default();
        options.validate()?;
        Ok(Validator {
            options: Arc::new(options),
            schema_validator: self.schema_validator.unwrap_or_else(default_schema_validator),
            external_validator: self.external_validator.unwrap_or_else(default_external_validator),
            logger: self.logger.unwrap_or_else(default_logger),
        })
    }
}
