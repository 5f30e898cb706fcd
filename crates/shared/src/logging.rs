//! Tracing setup for the catalog binary.
//!
//! Console output goes to stderr so stdout only carries command output.
//! File output rolls daily under the configured log directory, either as
//! plain text or as JSON lines.

use crate::config::Config;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Resolved logging settings
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_dir: PathBuf,
    /// Crate name; also the log file prefix
    pub component: String,
    pub level: Level,
    pub console: bool,
    pub file: bool,
    pub json: bool,
}

impl LogConfig {
    /// Settings for `component` taken from the `[logging]` section
    pub fn from_config(config: &Config, component: &str) -> Self {
        Self {
            log_dir: config.log_dir(),
            component: component.to_string(),
            level: parse_level(&config.logging.default_level),
            console: config.logging.console,
            file: config.logging.file,
            json: config.logging.json_format,
        }
    }

    /// `EnvFilter` directives used when `RUST_LOG` is unset
    ///
    /// HTTP crates stay at `warn` unless `RUST_LOG` asks for more.
    pub fn filter_directives(&self) -> String {
        let target = self.component.replace('-', "_");
        format!(
            "{target}={level},shared={level},hyper=warn,reqwest=warn,h2=warn",
            level = self.level
        )
    }
}

/// Level from its config name; unknown names mean INFO
pub fn parse_level(name: &str) -> Level {
    name.trim().parse::<Level>().unwrap_or_else(|_| {
        tracing::warn!(level = name, "Unknown log level, defaulting to info");
        Level::INFO
    })
}

/// Install the global subscriber
///
/// Fails if a subscriber is already set or the log directory can't be made.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let mut layers = Vec::new();

    if config.console {
        layers.push(fmt::layer().with_writer(std::io::stderr).boxed());
    }

    if config.file {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("Failed to create log directory: {}", config.log_dir.display())
        })?;

        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.component);
        let layer = fmt::layer().with_writer(appender).with_ansi(false);
        layers.push(if config.json {
            layer
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .boxed()
        } else {
            layer.with_span_events(FmtSpan::CLOSE).boxed()
        });
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::info!(
        component = %config.component,
        level = %config.level,
        log_dir = %config.log_dir.display(),
        "Logging initialized"
    );

    Ok(())
}
