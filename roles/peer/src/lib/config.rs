//! ## Configuration Module
//!
//! Defines [`PeerConfig`], read from a TOML file via `ext-config` and `serde`.
//!
//! Keys are written in hex: the static secret key as 32 bytes, node ids as 33-byte compressed
//! public keys.

use key_utils::{Secp256k1PublicKey, Secp256k1SecretKey};
use network_helpers_bolt8::codec_bolt8::MAX_MESSAGE_SIZE;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::PeerError;

/// A peer dialed at start-up.
#[derive(Debug, Deserialize, Clone)]
pub struct PeerAddress {
    pub address: String,
    pub node_id: Secp256k1PublicKey,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PeerConfig {
    listen_address: Option<String>,
    static_secret_key: Secp256k1SecretKey,
    #[serde(
        deserialize_with = "config_helpers_bolt8::duration_from_toml",
        default = "default_handshake_timeout"
    )]
    handshake_timeout: Duration,
    #[serde(default = "default_max_message_size")]
    max_message_size: usize,
    #[serde(default)]
    peers: Vec<PeerAddress>,
    greeting: Option<String>,
    log_file: Option<PathBuf>,
}

impl PeerConfig {
    pub fn new(static_secret_key: Secp256k1SecretKey) -> Self {
        Self {
            listen_address: None,
            static_secret_key,
            handshake_timeout: default_handshake_timeout(),
            max_message_size: default_max_message_size(),
            peers: Vec::new(),
            greeting: None,
            log_file: None,
        }
    }

    /// Rejects settings the transport can not honor.
    pub fn validate(&self) -> Result<(), PeerError> {
        if self.max_message_size > MAX_MESSAGE_SIZE {
            return Err(PeerError::BadConfig(format!(
                "max_message_size {} exceeds {}",
                self.max_message_size, MAX_MESSAGE_SIZE
            )));
        }
        if self.handshake_timeout.is_zero() {
            return Err(PeerError::BadConfig(
                "handshake_timeout must not be zero".to_string(),
            ));
        }
        if self.listen_address.is_none() && self.peers.is_empty() {
            return Err(PeerError::BadConfig(
                "nothing to do: set listen_address or at least one peer".to_string(),
            ));
        }
        Ok(())
    }

    pub fn listen_address(&self) -> Option<&str> {
        self.listen_address.as_deref()
    }

    pub fn static_secret_key(&self) -> &Secp256k1SecretKey {
        &self.static_secret_key
    }

    /// Node id derived from the static secret key.
    pub fn node_id(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey::from(self.static_secret_key)
    }

    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    pub fn peers(&self) -> &[PeerAddress] {
        &self.peers
    }

    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    pub fn set_listen_address(&mut self, address: String) {
        self.listen_address = Some(address);
    }

    pub fn add_peer(&mut self, peer: PeerAddress) {
        self.peers.push(peer);
    }

    pub fn set_handshake_timeout(&mut self, timeout: Duration) {
        self.handshake_timeout = timeout;
    }

    pub fn set_greeting(&mut self, greeting: String) {
        self.greeting = Some(greeting);
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn set_log_file(&mut self, log_file: Option<PathBuf>) {
        if let Some(path) = log_file {
            self.log_file = Some(path);
        }
    }
}

fn default_handshake_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_message_size() -> usize {
    MAX_MESSAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use ext_config::{Config, ConfigError, File, FileFormat};

    const MINIMAL: &str = r#"
        listen_address = "127.0.0.1:9735"
        static_secret_key = "1111111111111111111111111111111111111111111111111111111111111111"
    "#;

    fn load_config_str(s: &str) -> Result<PeerConfig, ConfigError> {
        Config::builder()
            .add_source(File::from_str(s, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn example_config_parses() {
        let settings = Config::builder()
            .add_source(File::new(
                "config-examples/peer-config-example.toml",
                FileFormat::Toml,
            ))
            .build()
            .expect("Failed to build config");
        let config: PeerConfig = settings.try_deserialize().expect("Failed to parse config");
        config.validate().unwrap();
        assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
        assert_eq!(config.peers().len(), 1);
        assert_eq!(
            config.peers()[0].node_id.to_string(),
            "034f355bdcb7cc0af728ef3cceb9615d90684bb5b2ca5f859ab0f0b704075871aa"
        );
        assert_eq!(
            config.node_id().to_string(),
            "028d7500dd4c12685d1f568b4c2b5048e8534b873319f3a8daa612b469132ec7f7"
        );
    }

    #[test]
    fn defaults_apply() {
        let config = load_config_str(MINIMAL).unwrap();
        config.validate().unwrap();
        assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_message_size(), MAX_MESSAGE_SIZE);
        assert!(config.peers().is_empty());
        assert!(config.greeting().is_none());
    }

    #[test]
    fn oversized_limit_is_rejected() {
        let config =
            load_config_str(&format!("{}\nmax_message_size = 70000", MINIMAL)).unwrap();
        assert!(matches!(config.validate(), Err(PeerError::BadConfig(_))));
    }

    #[test]
    fn bad_key_fails_to_parse() {
        let s = MINIMAL.replace("1111111111111111", "zz");
        assert!(load_config_str(&s).is_err());
    }
}
