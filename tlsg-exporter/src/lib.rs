//! Prometheus exporter for TP-Link TL-SG easy smart switches.
//!
//! Every request on the metrics endpoint polls all configured switches, one
//! after the other, and streams their per-port metrics back as they arrive.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   TL-SG web UI  │<────│    Collector    │────>│   HTTP Server   │
//! │ (status page)   │     │ (login, parse)  │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! tlsg-exporter --config switches.json5
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod collector;
pub mod config;
pub mod encoder;
pub mod http;
pub mod mapping;

pub use collector::{
    MetricSink, ScrapeFailure, ScrapeResult, ScrapeSummary, SharedCollector, SwitchCollector,
    scrape_switch,
};
pub use config::{ConfigError, ExporterConfig, LogFormat, LoggingConfig};
pub use encoder::TextEncoder;
pub use http::HttpServer;

/// Initialize tracing from the logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}
