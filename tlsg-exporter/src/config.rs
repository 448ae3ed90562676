//! Configuration for the exporter.

use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use tlsg_switch::SwitchConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json5(#[from] json5::Error),
    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Missing switch definition in configuration")]
    NoSwitches,
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// Switches to poll on every scrape, in order.
    #[serde(default, alias = "switch")]
    pub switches: Vec<SwitchConfig>,

    /// Port to serve metrics on. Overrides the port of `prometheus.listen`.
    #[serde(default)]
    pub http_port: Option<u16>,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:9717").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Metric name prefix (default: "tplink_sg").
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_listen() -> String {
    "0.0.0.0:9717".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_prefix() -> String {
    "tplink_sg".to_string()
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            prefix: default_prefix(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl ExporterConfig {
    /// Load configuration from a file.
    ///
    /// `.yaml` and `.yml` files are read as YAML, anything else as JSON5.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Self::parse_yaml(&content)
        } else {
            Self::parse(&content)
        }
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the listen address, e.g. from the command line.
    ///
    /// The new address is taken as is; a configured `http_port` no longer
    /// applies.
    pub fn override_listen(&mut self, listen: String) {
        self.prometheus.listen = listen;
        self.http_port = None;
    }

    /// Socket address to serve metrics on.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let mut addr: SocketAddr = self.prometheus.listen.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            ))
        })?;

        if let Some(port) = self.http_port {
            addr.set_port(port);
        }

        Ok(addr)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.switches.is_empty() {
            return Err(ConfigError::NoSwitches);
        }

        let mut seen = HashSet::new();
        for switch in &self.switches {
            switch
                .validate()
                .map_err(|e| ConfigError::Validation(e.to_string()))?;

            if !seen.insert(switch.host_label()) {
                return Err(ConfigError::Validation(format!(
                    "Switch {} is configured more than once",
                    switch.host_label()
                )));
            }
        }

        self.listen_addr()?;

        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if self.prometheus.path == "/health" {
            return Err(ConfigError::Validation(
                "Metrics path must not be /health".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let json = r#"{
            switches: [{ address: "192.168.0.2", username: "admin", password: "pw" }]
        }"#;
        let config = ExporterConfig::parse(json).unwrap();

        assert_eq!(config.switches.len(), 1);
        assert_eq!(config.prometheus.listen, "0.0.0.0:9717");
        assert_eq!(config.prometheus.path, "/metrics");
        assert_eq!(config.prometheus.prefix, "tplink_sg");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.listen_addr().unwrap().port(), 9717);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            switches: [
                {
                    address: "192.168.0.2",
                    username: "admin",
                    password: "pw",
                    cache_session: true,
                    port_descriptions: { "1": "uplink" }
                },
                { address: "192.168.0.3", http_port: 8080, username: "admin", password: "pw" }
            ],
            prometheus: {
                listen: "127.0.0.1:9100",
                path: "/switch/metrics",
                prefix: "lab"
            },
            logging: {
                level: "debug",
                format: "json"
            }
        }"#;
        let config = ExporterConfig::parse(json).unwrap();

        assert_eq!(config.switches.len(), 2);
        assert!(config.switches[0].cache_session);
        assert_eq!(config.switches[1].http_port, 8080);
        assert_eq!(config.prometheus.path, "/switch/metrics");
        assert_eq!(config.prometheus.prefix, "lab");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.listen_addr().unwrap(),
            "127.0.0.1:9100".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_parse_yaml_legacy_layout() {
        let yaml = r#"
http_port: 9101
switch:
  - ip: 192.168.0.2
    username: admin
    password: pw
    port_descriptions:
      1: uplink
      5: printer
  - ip: 192.168.0.3
    username: admin
    password: pw
    cache_login: true
"#;
        let config = ExporterConfig::parse_yaml(yaml).unwrap();

        assert_eq!(config.switches.len(), 2);
        assert_eq!(config.switches[0].address, "192.168.0.2");
        assert_eq!(
            config.switches[0].port_descriptions.get(&5).map(String::as_str),
            Some("printer")
        );
        assert!(config.switches[1].cache_session);
        assert_eq!(config.listen_addr().unwrap().port(), 9101);
    }

    #[test]
    fn test_override_listen_wins_over_http_port() {
        let yaml = "http_port: 9101\nswitch:\n  - ip: 192.168.0.2\n    username: admin\n    password: pw\n";
        let mut config = ExporterConfig::parse_yaml(yaml).unwrap();

        config.override_listen("127.0.0.1:9999".to_string());

        assert_eq!(
            config.listen_addr().unwrap(),
            "127.0.0.1:9999".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_missing_switches() {
        let result = ExporterConfig::parse("{ http_port: 9100 }");
        assert!(matches!(result, Err(ConfigError::NoSwitches)));

        let result = ExporterConfig::parse_yaml("http_port: 9100\nswitch: []\n");
        assert!(matches!(result, Err(ConfigError::NoSwitches)));
    }

    #[test]
    fn test_invalid_switch() {
        let json = r#"{ switches: [{ address: "", username: "admin", password: "pw" }] }"#;
        let result = ExporterConfig::parse(json);

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_duplicate_switch() {
        let json = r#"{
            switches: [
                { address: "sw", username: "admin", password: "pw" },
                { address: "sw", http_port: 80, username: "other", password: "pw" }
            ]
        }"#;
        let result = ExporterConfig::parse(json);

        assert!(result.unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn test_validate_invalid_listen() {
        let json = r#"{
            switches: [{ address: "sw", username: "admin", password: "pw" }],
            prometheus: { listen: "not-an-address" }
        }"#;
        let result = ExporterConfig::parse(json);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Invalid listen address")
        );
    }

    #[test]
    fn test_validate_invalid_path() {
        let json = r#"{
            switches: [{ address: "sw", username: "admin", password: "pw" }],
            prometheus: { path: "metrics" }
        }"#;
        let result = ExporterConfig::parse(json);

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must start with /")
        );
    }

    #[test]
    fn test_unparseable_config() {
        assert!(matches!(
            ExporterConfig::parse("{ switches: ["),
            Err(ConfigError::Json5(_))
        ));
        assert!(matches!(
            ExporterConfig::parse_yaml("switch: [: :"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("exporter.yaml");
        std::fs::write(
            &yaml_path,
            "switch:\n  - ip: 10.0.0.1\n    username: admin\n    password: pw\n",
        )
        .unwrap();
        let config = ExporterConfig::load_from_file(&yaml_path).unwrap();
        assert_eq!(config.switches[0].address, "10.0.0.1");

        let json_path = dir.path().join("exporter.json5");
        std::fs::write(
            &json_path,
            r#"{ switches: [{ address: "10.0.0.2", username: "admin", password: "pw" }] }"#,
        )
        .unwrap();
        let config = ExporterConfig::load_from_file(&json_path).unwrap();
        assert_eq!(config.switches[0].address, "10.0.0.2");

        let missing = ExporterConfig::load_from_file(dir.path().join("missing.json5"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
