//! Service configuration.
//!
//! Loaded once at startup from a YAML file; the `setup` binary generates a
//! fresh key and a config with defaults. Nothing here is reloadable: the
//! signing key in particular lives for the life of the process.

use crate::producer::Producer;
use letsrevoke_cryptography::{ed25519::PrivateKey, from_hex_formatted};
use letsrevoke_dictionary::{
    EncodingPolicy, SelectionPolicy, DEFAULT_FP_RATE, DEFAULT_MAX_DEPTH,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, time::Duration};
use thiserror::Error as ThisError;

/// Default bound on `TotalCerts` per request. Sized to the largest
/// population the service is expected to serve; at this bound the revocation
/// bit-vector costs 1.25 MiB per in-flight build.
pub const DEFAULT_MAX_POPULATION: u64 = 10_000_000;

/// Default build deadline.
pub const DEFAULT_BUILD_TIMEOUT_MS: u64 = 30_000;

/// Errors raised while loading configuration.
#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Revocation selection policy configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SelectionConfig {
    #[default]
    Prefix,
    Sampled {
        seed: u64,
    },
}

/// Dictionary encoding policy configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum EncodingConfig {
    Cascade {
        #[serde(default = "default_fp_numerator")]
        fp_numerator: u64,
        #[serde(default = "default_fp_denominator")]
        fp_denominator: u64,
        #[serde(default = "default_max_depth")]
        max_depth: usize,
    },
    Vector,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self::Cascade {
            fp_numerator: default_fp_numerator(),
            fp_denominator: default_fp_denominator(),
            max_depth: default_max_depth(),
        }
    }
}

/// Authority service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Address the HTTP server binds.
    pub listen: SocketAddr,
    /// Hex-encoded Ed25519 private key.
    pub private_key: String,
    #[serde(default = "default_max_population")]
    pub max_population: u64,
    #[serde(default = "default_build_timeout_ms")]
    pub build_timeout_ms: u64,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub encoding: EncodingConfig,
}

impl Config {
    /// Creates a config with defaults for everything but the address and
    /// key.
    pub fn new(listen: SocketAddr, private_key: &PrivateKey) -> Self {
        Self {
            listen,
            private_key: private_key.to_string(),
            max_population: default_max_population(),
            build_timeout_ms: default_build_timeout_ms(),
            selection: SelectionConfig::default(),
            encoding: EncodingConfig::default(),
        }
    }

    /// Loads a config from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_population == 0 {
            return Err(ConfigError::InvalidValue(
                "max_population",
                "must be positive".into(),
            ));
        }
        if self.build_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "build_timeout_ms",
                "must be positive".into(),
            ));
        }
        if let EncodingConfig::Cascade {
            fp_numerator,
            fp_denominator,
            max_depth,
        } = &self.encoding
        {
            if *fp_numerator == 0 || fp_numerator >= fp_denominator {
                return Err(ConfigError::InvalidValue(
                    "encoding",
                    format!("false-positive rate {fp_numerator}/{fp_denominator} is not below 1"),
                ));
            }
            if *max_depth == 0 {
                return Err(ConfigError::InvalidValue(
                    "encoding",
                    "max_depth must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    /// Parses the configured signing key.
    pub fn signer(&self) -> Result<PrivateKey, ConfigError> {
        let raw =
            from_hex_formatted(&self.private_key).ok_or(ConfigError::InvalidPrivateKey)?;
        PrivateKey::try_from(raw.as_slice()).map_err(|_| ConfigError::InvalidPrivateKey)
    }

    /// Builds the request producer this config describes.
    pub fn producer(&self) -> Result<Producer, ConfigError> {
        let selection = match &self.selection {
            SelectionConfig::Prefix => SelectionPolicy::Prefix,
            SelectionConfig::Sampled { seed } => SelectionPolicy::Sampled { seed: *seed },
        };
        let encoding = match &self.encoding {
            EncodingConfig::Cascade {
                fp_numerator,
                fp_denominator,
                max_depth,
            } => EncodingPolicy::Cascade {
                fp_numerator: *fp_numerator,
                fp_denominator: *fp_denominator,
                max_depth: *max_depth,
            },
            EncodingConfig::Vector => EncodingPolicy::Vector,
        };
        Ok(Producer::new(
            self.signer()?,
            self.max_population,
            Duration::from_millis(self.build_timeout_ms),
            selection,
            encoding,
        ))
    }
}

fn default_max_population() -> u64 {
    DEFAULT_MAX_POPULATION
}

fn default_build_timeout_ms() -> u64 {
    DEFAULT_BUILD_TIMEOUT_MS
}

fn default_fp_numerator() -> u64 {
    DEFAULT_FP_RATE.0
}

fn default_fp_denominator() -> u64 {
    DEFAULT_FP_RATE.1
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let key = PrivateKey::from_seed(0);
        let config = Config::new("127.0.0.1:8080".parse().unwrap(), &key);
        let raw = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(parsed.listen, config.listen);
        assert_eq!(parsed.signer().unwrap(), key);
        assert_eq!(parsed.max_population, DEFAULT_MAX_POPULATION);
    }

    #[test]
    fn test_minimal_yaml() {
        let key = PrivateKey::from_seed(7);
        let raw = format!("listen: 127.0.0.1:8080\nprivate_key: \"{key}\"\n");
        let config: Config = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(config.selection, SelectionConfig::Prefix);
        assert_eq!(config.encoding, EncodingConfig::default());
        assert!(config.producer().is_ok());
    }

    #[test]
    fn test_sampled_selection_yaml() {
        let key = PrivateKey::from_seed(7);
        let raw = format!(
            "listen: 127.0.0.1:8080\nprivate_key: \"{key}\"\nselection:\n  policy: sampled\n  seed: 42\n"
        );
        let config: Config = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(config.selection, SelectionConfig::Sampled { seed: 42 });
    }

    #[test]
    fn test_invalid_key_rejected() {
        let raw = "listen: 127.0.0.1:8080\nprivate_key: \"abcd\"\n";
        let config: Config = serde_yaml::from_str(raw).unwrap();
        assert!(matches!(
            config.signer(),
            Err(ConfigError::InvalidPrivateKey)
        ));
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let key = PrivateKey::from_seed(7);
        let config = Config {
            encoding: EncodingConfig::Cascade {
                fp_numerator: 2,
                fp_denominator: 1,
                max_depth: 64,
            },
            ..Config::new("127.0.0.1:8080".parse().unwrap(), &key)
        };
        assert!(config.validate().is_err());
    }
}
