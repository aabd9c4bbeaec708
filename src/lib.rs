//! # netex-validate
//!
//! A NetEX Profile XML validation engine: structural (XSD) validation, rule
//! checks (XPath-backed and object-model), and cross-file identifier
//! consistency, run over a single document or an entire ZIP dataset.

pub mod cache;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod identifiers;
pub mod logger;
pub mod model;
pub mod object_model;
pub mod options;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod schema;
pub mod validator;
pub mod xpath;

pub use cache::ResultCache;
pub use error::{CacheError, CacheResult, EngineError, Result, SchemaError, SchemaResult};
pub use identifiers::{
    DefaultExternalReferenceValidator, DuplicateInFile, ExternalReferenceValidator,
    FrenchExternalReferenceValidator, IdentifierStore,
};
pub use logger::{default_logger, Logger};
pub use model::{DataLocation, Severity, ValidationIssue, ValidationReport, ValidationRule};
pub use options::{LogFormat, LogLevel, Options, OptionsBuilder};
pub use rules::default_rule_catalogue;
pub use schema::{LibXml2SchemaValidator, SchemaValidator, StructuralError};
pub use validator::{Validator, ValidatorBuilder};
