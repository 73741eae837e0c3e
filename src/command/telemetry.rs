//! Telemetry and logging for SQL generation
//!
//! Events go through `tracing`; whether they are emitted at all is
//! controlled by an environment variable, so a subscriber that listens to
//! everything still stays quiet by default.
//!
//! # Configuration
//!
//! Set the `RELSQL_LOG_LEVEL` environment variable to one of:
//! - `off` - No logging (default)
//! - `basic` - Log SQL (truncated) and timing only
//! - `detailed` - Log full SQL, parameters, cacheability and tags
//! - `debug` - Log everything including every optimized sub-tree
//!
//! # Example
//!
//! ```bash
//! export RELSQL_LOG_LEVEL=detailed
//! ```

use super::relational::{RelationalCommand, RelationalParameter};
use crate::ast::Expr;
use std::time::Instant;

/// Environment variable holding the log level
pub const LOG_LEVEL_ENV: &str = "RELSQL_LOG_LEVEL";

/// SQL longer than this is truncated at `basic` level
const BASIC_SQL_LIMIT: usize = 1000;

/// Log level for SQL telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// No logging
    #[default]
    Off = 0,
    /// Basic info: SQL and timing
    Basic = 1,
    /// Detailed: SQL, parameters, cacheability
    Detailed = 2,
    /// Debug: everything including optimized expression trees
    Debug = 3,
}

impl LogLevel {
    /// Parse from string; unknown values mean `Off`
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "basic" => Self::Basic,
            "detailed" => Self::Detailed,
            "debug" => Self::Debug,
            _ => Self::Off,
        }
    }
}

/// Get current log level from environment
///
/// Checks `RELSQL_LOG_LEVEL` environment variable.
pub fn get_log_level() -> LogLevel {
    std::env::var(LOG_LEVEL_ENV)
        .map(|s| LogLevel::parse(&s))
        .unwrap_or(LogLevel::Off)
}

/// Log a generated command
pub fn log_command(level: LogLevel, command: &RelationalCommand, tags: &[String]) {
    if level < LogLevel::Basic {
        return;
    }

    let sql = &command.command_text;
    if level >= LogLevel::Detailed || sql.len() <= BASIC_SQL_LIMIT {
        tracing::info!(target: "relational_sqlgen", "SQL:\n{}", sql);
    } else {
        let cut = floor_char_boundary(sql, BASIC_SQL_LIMIT);
        tracing::info!(target: "relational_sqlgen", "SQL:\n{}...", &sql[..cut]);
    }

    if level < LogLevel::Detailed {
        return;
    }

    tracing::info!(
        target: "relational_sqlgen",
        cacheable = command.cacheable,
        parameters = command.parameters.len(),
        "command generated"
    );
    for parameter in &command.parameters {
        match parameter {
            RelationalParameter::Single(binding) => tracing::info!(
                target: "relational_sqlgen",
                "Param {}: {:?} nullable={}",
                binding.name,
                binding.type_mapping.as_ref().map(|m| m.store_type.as_str()),
                binding.nullable
            ),
            RelationalParameter::Composite {
                invariant_name,
                members,
            } => tracing::info!(
                target: "relational_sqlgen",
                "Param {}: composite of {} member(s)",
                invariant_name,
                members.len()
            ),
        }
    }
    for tag in tags {
        tracing::info!(target: "relational_sqlgen", "Tag: {}", tag);
    }
}

/// Log the normalized form of a sub-tree about to be emitted
pub fn log_optimized(level: LogLevel, context: &str, expr: &Expr) {
    if level < LogLevel::Debug {
        return;
    }
    tracing::debug!(target: "relational_sqlgen", "optimized {}: {:?}", context, expr);
}

/// Log a literal rendered through a value-converting mapping
pub fn log_value_conversion_warning(level: LogLevel, message: &str) {
    if level < LogLevel::Basic {
        return;
    }
    tracing::warn!(target: "relational_sqlgen", "{}", message);
}

/// Log a generation failure
pub fn log_error(level: LogLevel, context: &str, error: &str) {
    if level < LogLevel::Basic {
        return;
    }
    tracing::warn!(target: "relational_sqlgen", "Error in {}: {}", context, error);
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// A guard that logs generation timing on drop
pub struct GenerationTimer {
    start: Instant,
    context: String,
    level: LogLevel,
    logged: bool,
}

impl GenerationTimer {
    /// Start a new generation timer
    pub fn new(context: impl Into<String>, level: LogLevel) -> Self {
        Self {
            start: Instant::now(),
            context: context.into(),
            level,
            logged: false,
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Mark as successful and log
    pub fn success(mut self) {
        self.logged = true;
        self.log_result(true);
    }

    /// Mark as failed and log
    pub fn failure(mut self, error: &str) {
        self.logged = true;
        log_error(self.level, &self.context, error);
        self.log_result(false);
    }

    fn log_result(&self, success: bool) {
        if self.level < LogLevel::Basic {
            return;
        }
        let status = if success { "completed" } else { "failed" };
        tracing::info!(
            target: "relational_sqlgen",
            "{} {} in {}ms",
            self.context,
            status,
            self.elapsed_ms()
        );
    }
}

impl Drop for GenerationTimer {
    fn drop(&mut self) {
        // Log if not already logged (implicit failure)
        if !self.logged {
            self.log_result(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("off"), LogLevel::Off);
        assert_eq!(LogLevel::parse("basic"), LogLevel::Basic);
        assert_eq!(LogLevel::parse("detailed"), LogLevel::Detailed);
        assert_eq!(LogLevel::parse("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("BASIC"), LogLevel::Basic);
        assert_eq!(LogLevel::parse("invalid"), LogLevel::Off);
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Off < LogLevel::Basic);
        assert!(LogLevel::Basic < LogLevel::Detailed);
        assert!(LogLevel::Detailed < LogLevel::Debug);
    }

    #[test]
    fn test_generation_timer() {
        let timer = GenerationTimer::new("test", LogLevel::Off);
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10);
        timer.success();
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let s = "aé";
        assert_eq!(floor_char_boundary(s, 2), 1);
        assert_eq!(floor_char_boundary(s, 1), 1);
    }
}
