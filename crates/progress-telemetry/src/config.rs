//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Whether to register the Prometheus collectors
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "progress-sync".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PX_SERVICE_NAME`: Service name (default: progress-sync)
    /// - `PX_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `PX_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `PX_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `PX_METRICS`: Register Prometheus collectors (default: true)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("PX_SERVICE_NAME")
                .unwrap_or_else(|_| "progress-sync".to_string()),

            log_level: env::var("PX_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("PX_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            json_logs: env::var("PX_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            metrics_enabled: env::var("PX_METRICS")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    /// Quiet configuration for command-line tools: warnings only.
    pub fn for_cli(verbose: bool) -> Self {
        let mut config = Self::from_env();
        if env::var("PX_LOG_LEVEL").is_err() && env::var("RUST_LOG").is_err() {
            config.log_level = if verbose { "debug" } else { "warn" }.to_string();
        }
        config
    }
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "progress-sync");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag(" YES "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
