//! Server configuration

use crate::protocol::Limits;
use crate::protocol::codec::{DEFAULT_MAX_KEY_LEN, DEFAULT_MAX_PAYLOAD_LEN, DEFAULT_MAX_VALUE_LEN};
use crate::{Error, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use tracing::{debug, info};

/// Largest payload a UDP datagram can carry over IPv4
pub const UDP_MAX_PAYLOAD_LEN: usize = 65_507;

pub const DEFAULT_PORT: u16 = 8080;

/// Shortest request line: verb, two separators, one-byte key.
const MIN_REQUEST_OVERHEAD: usize = "DEFINE".len() + 2 + 1;

/// Settings handed to the core at start-up
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub bind_port: u16,
    pub max_payload_len: usize,
    pub max_key_len: usize,
    pub max_value_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            bind_port: DEFAULT_PORT,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            max_key_len: DEFAULT_MAX_KEY_LEN,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file; absent fields take defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading configuration file: {:?}", path);

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))?;

        info!("Configuration loaded from {:?}", path);
        Ok(config)
    }

    /// Check that the limits are usable together
    pub fn validate(&self) -> Result<()> {
        if self.max_payload_len == 0 || self.max_key_len == 0 || self.max_value_len == 0 {
            return Err(Error::Config("length limits must be non-zero".to_string()));
        }

        if self.max_payload_len > UDP_MAX_PAYLOAD_LEN {
            return Err(Error::Config(format!(
                "max_payload_len {} exceeds the UDP limit of {}",
                self.max_payload_len, UDP_MAX_PAYLOAD_LEN
            )));
        }

        if self.max_payload_len < MIN_REQUEST_OVERHEAD + 1 {
            return Err(Error::Config(format!(
                "max_payload_len {} cannot hold a single request",
                self.max_payload_len
            )));
        }

        if self.max_key_len >= self.max_payload_len || self.max_value_len >= self.max_payload_len {
            return Err(Error::Config(format!(
                "key ({}) and value ({}) limits must be below max_payload_len ({})",
                self.max_key_len, self.max_value_len, self.max_payload_len
            )));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.bind_port)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_payload_len: self.max_payload_len,
            max_key_len: self.max_key_len,
            max_value_len: self.max_value_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.socket_addr(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.limits(), Limits::default());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let file = write_config(r#"{ "bind_port": 9999, "max_key_len": 32 }"#);
        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.bind_port, 9999);
        assert_eq!(config.max_key_len, 32);
        assert_eq!(config.max_value_len, DEFAULT_MAX_VALUE_LEN);
        assert_eq!(config.bind_addr, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_config(r#"{ "bind_port": 1, "ttl": 30 }"#);
        assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        assert!(matches!(Config::load(&missing), Err(Error::Config(_))));
    }

    #[test]
    fn validation_rejects_unusable_limits() {
        let zero = Config {
            max_key_len: 0,
            ..Config::default()
        };
        assert!(zero.validate().is_err());

        let huge = Config {
            max_payload_len: UDP_MAX_PAYLOAD_LEN + 1,
            ..Config::default()
        };
        assert!(huge.validate().is_err());

        let key_too_big = Config {
            max_key_len: DEFAULT_MAX_PAYLOAD_LEN,
            ..Config::default()
        };
        assert!(key_too_big.validate().is_err());
    }
}
