//! Static identity of one switch.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Connection settings and port naming for one switch.
///
/// Immutable once loaded. The mutable session lives in
/// [`SwitchClient`](crate::SwitchClient).
#[derive(Clone, Deserialize)]
pub struct SwitchConfig {
    /// Host name or IP address of the switch.
    #[serde(alias = "ip")]
    pub address: String,

    /// Port of the web interface (default: 80).
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Web interface user.
    pub username: String,

    /// Web interface password.
    pub password: String,

    /// Reuse the login across scrapes instead of logging in every time
    /// (default: false, the switch drops sessions quickly).
    #[serde(default, alias = "cache_login")]
    pub cache_session: bool,

    /// Human-readable port names, keyed by 1-based port number.
    #[serde(
        default,
        alias = "port_names",
        deserialize_with = "deserialize_port_descriptions"
    )]
    pub port_descriptions: BTreeMap<u32, String>,

    /// Per-request timeout in milliseconds (default: 5000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_http_port() -> u16 {
    80
}

fn default_timeout_ms() -> u64 {
    5000
}

impl SwitchConfig {
    /// Create a configuration with default port, timeout and session policy.
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            http_port: default_http_port(),
            username: username.into(),
            password: password.into(),
            cache_session: false,
            port_descriptions: BTreeMap::new(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Set the web interface port.
    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    /// Enable or disable session caching.
    pub fn with_cache_session(mut self, cache: bool) -> Self {
        self.cache_session = cache;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Name a port.
    pub fn with_port_description(mut self, port: u32, description: impl Into<String>) -> Self {
        self.port_descriptions.insert(port, description.into());
        self
    }

    /// Root URL of the web interface, e.g. `http://192.168.0.1:80`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.address, self.http_port)
    }

    /// Identity used in logs and metric labels: the address, plus the port
    /// when it is not the default one.
    pub fn host_label(&self) -> String {
        if self.http_port == default_http_port() {
            self.address.clone()
        } else {
            format!("{}:{}", self.address, self.http_port)
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::Config("switch address must not be empty".to_string()));
        }

        if self.username.is_empty() {
            return Err(Error::Config(format!(
                "switch {}: username must not be empty",
                self.address
            )));
        }

        if self.timeout_ms == 0 {
            return Err(Error::Config(format!(
                "switch {}: timeout_ms must be > 0",
                self.address
            )));
        }

        if self.port_descriptions.contains_key(&0) {
            return Err(Error::Config(format!(
                "switch {}: port numbers start at 1",
                self.address
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for SwitchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchConfig")
            .field("address", &self.address)
            .field("http_port", &self.http_port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("cache_session", &self.cache_session)
            .field("port_descriptions", &self.port_descriptions)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl fmt::Display for SwitchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.address, self.http_port)
    }
}

/// Port number used as a map key. YAML gives integers, JSON5 gives strings.
struct PortKey(u32);

impl<'de> Deserialize<'de> for PortKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PortKeyVisitor;

        impl Visitor<'_> for PortKeyVisitor {
            type Value = PortKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a port number")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<PortKey, E> {
                u32::try_from(v)
                    .map(PortKey)
                    .map_err(|_| E::custom(format!("port number out of range: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<PortKey, E> {
                u32::try_from(v)
                    .map(PortKey)
                    .map_err(|_| E::custom(format!("port number out of range: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<PortKey, E> {
                v.trim()
                    .parse()
                    .map(PortKey)
                    .map_err(|_| E::custom(format!("invalid port number: {v:?}")))
            }
        }

        deserializer.deserialize_any(PortKeyVisitor)
    }
}

fn deserialize_port_descriptions<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<u32, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct DescriptionsVisitor;

    impl<'de> Visitor<'de> for DescriptionsVisitor {
        type Value = BTreeMap<u32, String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of port number to description")
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(BTreeMap::new())
        }

        fn visit_map<A: MapAccess<'de>>(
            self,
            mut map: A,
        ) -> std::result::Result<Self::Value, A::Error> {
            let mut descriptions = BTreeMap::new();
            while let Some((PortKey(port), description)) = map.next_entry::<PortKey, String>()? {
                descriptions.insert(port, description);
            }
            Ok(descriptions)
        }
    }

    deserializer.deserialize_any(DescriptionsVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json5_minimal() {
        let json = r#"{ address: "192.168.0.2", username: "admin", password: "secret" }"#;
        let config: SwitchConfig = json5::from_str(json).unwrap();

        assert_eq!(config.address, "192.168.0.2");
        assert_eq!(config.http_port, 80);
        assert!(!config.cache_session);
        assert!(config.port_descriptions.is_empty());
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.base_url(), "http://192.168.0.2:80");
        assert_eq!(config.host_label(), "192.168.0.2");
    }

    #[test]
    fn test_host_label_with_port() {
        let config = SwitchConfig::new("10.0.0.1", "admin", "pw").with_http_port(8080);

        assert_eq!(config.host_label(), "10.0.0.1:8080");
    }

    #[test]
    fn test_parse_json5_port_descriptions() {
        let json = r#"{
            address: "sw1",
            username: "admin",
            password: "secret",
            cache_session: true,
            port_descriptions: { "1": "uplink", "8": "nas" }
        }"#;
        let config: SwitchConfig = json5::from_str(json).unwrap();

        assert!(config.cache_session);
        assert_eq!(config.port_descriptions.get(&1).map(String::as_str), Some("uplink"));
        assert_eq!(config.port_descriptions.get(&8).map(String::as_str), Some("nas"));
    }

    #[test]
    fn test_parse_yaml_legacy_keys() {
        let yaml = r#"
ip: 10.0.0.5
http_port: 8080
username: admin
password: secret
cache_login: true
port_descriptions:
  1: uplink
  2: "access point"
"#;
        let config: SwitchConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.address, "10.0.0.5");
        assert_eq!(config.http_port, 8080);
        assert!(config.cache_session);
        assert_eq!(config.port_descriptions.len(), 2);
        assert_eq!(
            config.port_descriptions.get(&2).map(String::as_str),
            Some("access point")
        );
    }

    #[test]
    fn test_parse_yaml_empty_descriptions() {
        let yaml = "ip: 10.0.0.5\nusername: admin\npassword: x\nport_descriptions:\n";
        let config: SwitchConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.port_descriptions.is_empty());
    }

    #[test]
    fn test_invalid_port_key() {
        let json = r#"{ address: "sw1", username: "a", password: "b", port_descriptions: { "uplink": "x" } }"#;
        let result: std::result::Result<SwitchConfig, _> = json5::from_str(json);

        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        assert!(SwitchConfig::new("sw1", "admin", "pw").validate().is_ok());
        assert!(SwitchConfig::new("", "admin", "pw").validate().is_err());
        assert!(SwitchConfig::new("sw1", "", "pw").validate().is_err());
        assert!(
            SwitchConfig::new("sw1", "admin", "pw")
                .with_timeout_ms(0)
                .validate()
                .is_err()
        );
        assert!(
            SwitchConfig::new("sw1", "admin", "pw")
                .with_port_description(0, "bogus")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = SwitchConfig::new("sw1", "admin", "hunter2");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
        assert_eq!(config.to_string(), "admin@sw1:80");
    }
}
