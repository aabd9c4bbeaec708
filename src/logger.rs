//! The narrow logging boundary the engine calls into (Section 6.1).
//!
//! The engine never calls `tracing` macros directly outside [`TracingLogger`];
//! every log call goes through the [`Logger`] trait so a caller's own
//! implementation fully replaces the default.

use std::fmt;
use std::sync::Arc;

use crate::options::{LogFormat, LogLevel};

/// Structured key-value context attached to a log line.
pub type Fields = Vec<(&'static str, String)>;

pub trait Logger: Send + Sync + fmt::Debug {
    fn debug(&self, message: &str, fields: Fields);
    fn info(&self, message: &str, fields: Fields);
    fn warn(&self, message: &str, fields: Fields);
    fn error(&self, message: &str, fields: Fields);
}

/// Default [`Logger`] implementation, backed by `tracing`.
#[derive(Debug, Clone)]
pub struct TracingLogger;

impl TracingLogger {
    /// Installs a global `tracing_subscriber` for the given level/format, the
    /// way the engine's default logger is constructed from `log_level` /
    /// `log_format` (Section 6). Safe to call more than once; later calls are
    /// no-ops, matching the "global default logger is replaced under a
    /// write-once" resource policy from Section 5.
    pub fn install(level: LogLevel, format: LogFormat) -> Self {
        use tracing_subscriber::EnvFilter;

        let level_filter = match level {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        let filter = EnvFilter::try_new(level_filter).unwrap_or_else(|_| EnvFilter::new("info"));

        let result = match format {
            LogFormat::Json => tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .try_init(),
            LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        };
        // try_init fails only if a subscriber is already installed; that's
        // fine, we just keep using whatever is already there.
        let _ = result;
        TracingLogger
    }
}

fn render_fields(fields: &Fields) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str, fields: Fields) {
        tracing::debug!(context = %render_fields(&fields), "{message}");
    }

    fn info(&self, message: &str, fields: Fields) {
        tracing::info!(context = %render_fields(&fields), "{message}");
    }

    fn warn(&self, message: &str, fields: Fields) {
        tracing::warn!(context = %render_fields(&fields), "{message}");
    }

    fn error(&self, message: &str, fields: Fields) {
        tracing::error!(context = %render_fields(&fields), "{message}");
    }
}

pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Recording logger double, used to verify "no engine log call bypasses
    /// the injected Logger" (Section 8.1, property 12).
    #[derive(Debug, Default)]
    pub struct RecordingLogger {
        pub lines: Mutex<Vec<(String, String)>>,
    }

    impl Logger for RecordingLogger {
        fn debug(&self, message: &str, _fields: Fields) {
            self.lines
                .lock()
                .unwrap()
                .push(("debug".to_string(), message.to_string()));
        }

        fn info(&self, message: &str, _fields: Fields) {
            self.lines
                .lock()
                .unwrap()
                .push(("info".to_string(), message.to_string()));
        }

        fn warn(&self, message: &str, _fields: Fields) {
            self.lines
                .lock()
                .unwrap()
                .push(("warn".to_string(), message.to_string()));
        }

        fn error(&self, message: &str, _fields: Fields) {
            self.lines
                .lock()
                .unwrap()
                .push(("error".to_string(), message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::RecordingLogger;
    use super::*;

    #[test]
    fn test_recording_logger_captures_calls() {
        let logger = RecordingLogger::default();
        logger.warn("rule skipped", vec![("rule_code", "FOO".to_string())]);
        let lines = logger.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, "warn");
        assert_eq!(lines[0].1, "rule skipped");
    }

    #[test]
    fn test_default_logger_does_not_panic() {
        let logger = default_logger();
        logger.info("engine constructed", vec![]);
    }
}
