//! The engine's minimal configuration surface (Section 6). Deliberately not a
//! YAML-loading `ConfigManager` — that construction belongs to the CLI
//! collaborator — but validated the way the teacher validated its `Config`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::model::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub codespace: String,
    pub skip_schema: bool,
    pub skip_rules: bool,
    pub max_schema_errors: usize,
    pub max_findings: usize,
    pub concurrent_files: usize,
    pub rule_overrides: HashMap<String, bool>,
    pub severity_overrides: HashMap<String, Severity>,
    pub enable_cache: bool,
    pub cache_max_entries: u64,
    pub cache_max_bytes: u64,
    pub cache_ttl: Duration,
    pub allow_schema_network: bool,
    pub schema_cache_dir: Option<PathBuf>,
    pub schema_http_timeout: Duration,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            codespace: "Default".to_string(),
            skip_schema: false,
            skip_rules: false,
            max_schema_errors: 100,
            max_findings: 0,
            concurrent_files: 1,
            rule_overrides: HashMap::new(),
            severity_overrides: HashMap::new(),
            enable_cache: false,
            cache_max_entries: 1000,
            cache_max_bytes: 50 * 1024 * 1024,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            allow_schema_network: false,
            schema_cache_dir: None,
            schema_http_timeout: Duration::from_secs(30),
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
        }
    }
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Mirrors the teacher's `validate_config` bounds-checking: reject
    /// nonsensical values at construction time rather than at first use.
    pub fn validate(&self) -> Result<()> {
        if self.concurrent_files == 0 {
            return Err(EngineError::InvalidOptions {
                reason: "concurrent_files must be >= 1".to_string(),
            });
        }
        if self.codespace.trim().is_empty() {
            return Err(EngineError::InvalidOptions {
                reason: "codespace must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn rule_enabled(&self, code: &str) -> bool {
        self.rule_overrides.get(code).copied().unwrap_or(true)
    }

    pub fn effective_severity(&self, code: &str, default: Severity) -> Severity {
        self.severity_overrides.get(code).copied().unwrap_or(default)
    }
}

/// Builder sugar over [`Options`]; not required for correctness (Section 9).
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    options: Options,
}

impl OptionsBuilder {
    pub fn codespace(mut self, codespace: impl Into<String>) -> Self {
        self.options.codespace = codespace.into();
        self
    }

    pub fn skip_schema(mut self, skip: bool) -> Self {
        self.options.skip_schema = skip;
        self
    }

    pub fn skip_rules(mut self, skip: bool) -> Self {
        self.options.skip_rules = skip;
        self
    }

    pub fn max_schema_errors(mut self, max: usize) -> Self {
        self.options.max_schema_errors = max;
        self
    }

    pub fn max_findings(mut self, max: usize) -> Self {
        self.options.max_findings = max;
        self
    }

    pub fn concurrent_files(mut self, n: usize) -> Self {
        self.options.concurrent_files = n;
        self
    }

    pub fn enable_cache(mut self, enable: bool) -> Self {
        self.options.enable_cache = enable;
        self
    }

    pub fn rule_override(mut self, code: impl Into<String>, enabled: bool) -> Self {
        self.options.rule_overrides.insert(code.into(), enabled);
        self
    }

    pub fn severity_override(mut self, code: impl Into<String>, severity: Severity) -> Self {
        self.options
            .severity_overrides
            .insert(code.into(), severity);
        self
    }

    pub fn build(self) -> Options {
        self.options
    }
}
