use std::process::ExitCode;

use netex_validator::cli::Cli;
use netex_validator::model::Severity;
use netex_validator::Validator;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let options = cli.to_options();

    let validator = match Validator::new(options) {
        Ok(validator) => validator,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let is_zip = cli
        .path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    let report = if is_zip {
        validator.validate_archive(&cli.path)
    } else {
        validator.validate_file(&cli.path)
    };

    let report = match report {
        Ok(report) => report,
        Err(err) => {
            eprintln!("failed to validate {}: {err}", cli.path.display());
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("failed to serialize report: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!(
            "{}: {} file(s) processed, {} finding(s)",
            report.codespace,
            report.files_processed,
            report.entries.len()
        );
        for issue in &report.entries {
            println!(
                "  [{:?}] {} — {} ({})",
                issue.severity, issue.rule_code, issue.message, issue.location.file_name
            );
        }
    }

    if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
