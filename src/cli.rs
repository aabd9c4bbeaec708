//! Thin command-line surface over the library (Section 6: CLI parsing and
//! exit-code policy are explicitly outside the engine's core). This module
//! only turns argv into an [`Options`](crate::options::Options) plus a
//! target path; `main.rs` drives the actual validation run and rendering.

use std::path::PathBuf;

use clap::Parser;

use crate::options::Options;

/// Validates a NetEX document or dataset against the profile's rules.
#[derive(Parser, Debug, Clone)]
#[command(name = "netex-validator")]
#[command(about = "Validate NetEX XML documents and datasets against the NeTEx profile")]
#[command(version)]
pub struct Cli {
    /// NetEX XML file or ZIP dataset to validate
    pub path: PathBuf,

    /// Codespace identifier stamped onto generated rule codes and the report
    #[arg(long = "codespace", default_value = "Default")]
    pub codespace: String,

    /// Number of files validated concurrently when `path` is a ZIP dataset
    #[arg(short = 't', long = "concurrency")]
    pub concurrency: Option<usize>,

    /// Maximum number of findings to collect before stopping (0 = unbounded)
    #[arg(long = "max-findings", default_value = "0")]
    pub max_findings: usize,

    /// Rule codes to skip entirely, may be repeated
    #[arg(long = "skip-rule", action = clap::ArgAction::Append)]
    pub skip_rules: Vec<String>,

    /// Disable the content-addressed result cache
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Emit the report as JSON instead of a human-readable summary
    #[arg(long = "json")]
    pub json: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn to_options(&self) -> Options {
        let mut builder = Options::builder()
            .codespace(self.codespace.clone())
            .max_findings(self.max_findings)
            .enable_cache(!self.no_cache);
        if let Some(concurrency) = self.concurrency {
            builder = builder.concurrent_files(concurrency);
        }
        for rule in &self.skip_rules {
            builder = builder.rule_override(rule.clone(), false);
        }
        builder.build()
    }
}
