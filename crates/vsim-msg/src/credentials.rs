//! ---
//! vsim_section: "02-messaging"
//! vsim_subsection: "module"
//! vsim_type: "source"
//! vsim_scope: "code"
//! vsim_description: "Message bus producers and batch publishing."
//! vsim_version: "v0.0.0-prealpha"
//! vsim_owner: "tbd"
//! ---
use std::fmt;

use vsim_common::config::{BusConfig, ConfigError};

/// SASL broker credentials for the event streams service.
#[derive(Clone, PartialEq, Eq)]
pub struct BusCredentials {
    /// `host:port` entries of the SASL broker list.
    pub brokers: Vec<String>,
    /// SASL user name.
    pub user: String,
    /// SASL password.
    pub api_key: String,
}

impl BusCredentials {
    /// Resolve credentials from the `[bus]` section. An empty broker list is rejected.
    pub fn from_config(config: &BusConfig) -> Result<Self, ConfigError> {
        let brokers: Vec<String> = config
            .brokers
            .iter()
            .map(|b| b.trim().to_owned())
            .filter(|b| !b.is_empty())
            .collect();
        if brokers.is_empty() {
            return Err(ConfigError::MissingParam("bus.brokers"));
        }
        Ok(Self {
            brokers,
            user: config.user.clone().unwrap_or_else(|| "token".to_owned()),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    /// Identity used by local sinks when no broker is configured.
    pub fn local() -> Self {
        Self {
            brokers: vec!["localhost:9093".to_owned()],
            user: "local".to_owned(),
            api_key: String::new(),
        }
    }

    /// Comma separated bootstrap list.
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }

    /// TLS server name: the host part of the first broker.
    pub fn tls_server_name(&self) -> Option<&str> {
        let first = self.brokers.first()?;
        Some(match first.rfind(':') {
            Some(idx) => &first[..idx],
            None => first.as_str(),
        })
    }
}

impl fmt::Debug for BusCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusCredentials")
            .field("brokers", &self.brokers)
            .field("user", &self.user)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(brokers: &[&str]) -> BusConfig {
        BusConfig {
            brokers: brokers.iter().map(|b| b.to_string()).collect(),
            user: Some("token".into()),
            api_key: Some("secret".into()),
            ..BusConfig::default()
        }
    }

    #[test]
    fn server_name_is_first_broker_host() {
        let creds = BusCredentials::from_config(&config(&[
            "broker-0.events.example:9093",
            "broker-1.events.example:9093",
        ]))
        .unwrap();
        assert_eq!(creds.tls_server_name(), Some("broker-0.events.example"));
        assert_eq!(
            creds.bootstrap_servers(),
            "broker-0.events.example:9093,broker-1.events.example:9093"
        );
    }

    #[test]
    fn empty_broker_list_is_rejected() {
        let err = BusCredentials::from_config(&config(&[" "])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingParam("bus.brokers")));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let creds = BusCredentials::from_config(&config(&["b:1"])).unwrap();
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("redacted"));
    }
}
