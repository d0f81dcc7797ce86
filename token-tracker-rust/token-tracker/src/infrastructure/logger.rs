use tracing::{error, debug, Level};
use tracing_subscriber::{
    layer::SubscriberExt,
    util::SubscriberInitExt,
    fmt::{self, time::UtcTime},
    EnvFilter,
    Registry,
    Layer,
};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling, rolling::Rotation};
use serde::{Serialize, Deserialize};
use std::sync::Once;
use std::fs;

use crate::infrastructure::config::Config;

static INIT: Once = Once::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub service_name: String,
    pub enable_console: bool,
    pub enable_file: bool,
    pub log_directory: String,
    pub enable_colors: bool,
    pub enable_thread_ids: bool,
    pub enable_file_line: bool,
    pub enable_module_path: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: "token-tracker".to_string(),
            enable_console: true,
            enable_file: true,
            log_directory: "logs".to_string(),
            enable_colors: true,
            enable_thread_ids: true,
            enable_file_line: true,
            enable_module_path: true,
        }
    }
}

impl LogConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            level: config.log_level.clone(),
            log_directory: config.log_dir.clone(),
            enable_colors: config.environment != "production",
            ..Self::default()
        }
    }

    pub fn level(&self) -> Level {
        match self.level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Rolling file prefix, e.g. `token_tracker.log`.
    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.service_name.replace('-', "_"))
    }

    /// Directive used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> String {
        format!("token_tracker={},actix_web=info", self.level())
    }
}

pub struct TrackerLogger {
    config: LogConfig,
}

impl TrackerLogger {
    pub fn new(config: LogConfig) -> Self {
        if config.enable_file {
            if let Err(e) = fs::create_dir_all(&config.log_directory) {
                eprintln!("Failed to create log directory: {e}");
            }
        }

        Self { config }
    }

    /// Installs the global subscriber. The returned guard flushes the file
    /// writer and must live as long as the process logs.
    pub fn init(&self) -> Option<WorkerGuard> {
        let mut file_guard = None;

        INIT.call_once(|| {
            let env_filter = EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| self.config.default_directive())
            );

            let mut layers: Vec<Box<dyn Layer<_> + Send + Sync>> = Vec::new();

            if self.config.enable_console {
                let console_layer = fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_thread_ids(self.config.enable_thread_ids)
                    .with_file(self.config.enable_file_line)
                    .with_line_number(self.config.enable_file_line)
                    .with_target(self.config.enable_module_path)
                    .with_ansi(self.config.enable_colors)
                    .with_writer(std::io::stdout);
                layers.push(Box::new(console_layer));
            }

            if self.config.enable_file {
                let file_appender = rolling::RollingFileAppender::new(
                    Rotation::DAILY,
                    &self.config.log_directory,
                    self.config.log_file_name(),
                );
                let (non_blocking_file_appender, guard) = non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .with_timer(UtcTime::rfc_3339())
                    .with_thread_ids(self.config.enable_thread_ids)
                    .with_file(self.config.enable_file_line)
                    .with_line_number(self.config.enable_file_line)
                    .with_target(self.config.enable_module_path)
                    .with_ansi(false)
                    .with_writer(non_blocking_file_appender);
                layers.push(Box::new(file_layer));
                file_guard = Some(guard);
            }

            let subscriber = Registry::default()
                .with(env_filter)
                .with(layers);

            if let Err(e) = subscriber.try_init() {
                eprintln!("Failed to install tracing subscriber: {e}");
            }
        });

        file_guard
    }
}

pub struct Logger;

impl Logger {
    pub fn init(config: &Config) -> Option<WorkerGuard> {
        TrackerLogger::new(LogConfig::from_config(config)).init()
    }

    pub fn rpc_call(method: &str, contract: &str) {
        debug!(method, contract, "Issuing contract call");
    }

    pub fn rpc_call_failed(method: &str, contract: &str, error: &str) {
        error!(method, contract, error, "Contract call failed");
    }

    pub fn indexer_call_failed(contract: &str, error: &str) {
        error!(contract, error, "Holder indexer request failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        let mut config = LogConfig::default();
        assert_eq!(config.level(), Level::INFO);

        config.level = "DEBUG".to_string();
        assert_eq!(config.level(), Level::DEBUG);

        config.level = "bogus".to_string();
        assert_eq!(config.level(), Level::INFO);
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            log_level: "warn".to_string(),
            log_dir: "/tmp/token-tracker-logs".to_string(),
            environment: "production".to_string(),
            ..Config::default()
        };
        let log_config = LogConfig::from_config(&config);

        assert_eq!(log_config.log_directory, "/tmp/token-tracker-logs");
        assert!(!log_config.enable_colors);
        assert_eq!(log_config.default_directive(), "token_tracker=WARN,actix_web=info");
    }

    #[test]
    fn test_log_file_named_after_service() {
        let mut config = LogConfig::default();
        assert_eq!(config.log_file_name(), "token_tracker.log");

        config.service_name = "holder-sync".to_string();
        assert_eq!(config.log_file_name(), "holder_sync.log");
    }
}
