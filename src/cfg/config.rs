// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Everything the [`crate::client::Client`] constructor needs.
///
/// `Client::new(host, port, size, debug)` is sugar over building one of
/// these with the defaults below and calling
/// [`crate::client::Client::with_config`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Memcached server hostname or address.
    pub host: String,
    /// Memcached server TCP port.
    pub port: u16,
    /// Number of connections kept warm in the idle pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// When true, the loop thread is not joined on `Drop` or on `close`,
    /// for quick interactive use where an orderly shutdown is not worth
    /// waiting for.
    #[serde(default)]
    pub debug: bool,
    /// Deadline for the startup `check` round-trip and for each initial
    /// `connect` during pool warm-up.
    #[serde(default = "default_connect_timeout", with = "serde_secs")]
    pub connect_timeout: Duration,
    /// Deadline for a single `get`/`set` mailbox wait.
    #[serde(default = "default_op_timeout", with = "serde_secs")]
    pub op_timeout: Duration,
}

fn default_pool_size() -> usize {
    5
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_op_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            pool_size: default_pool_size(),
            debug: false,
            connect_timeout: default_connect_timeout(),
            op_timeout: default_op_timeout(),
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port, ..Self::default() }
    }

    /// Loads configuration from a YAML file and validates it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file {:?}", path.as_ref()))?;
        let cfg: ClientConfig =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.host.is_empty(), "host must not be empty");
        ensure!(self.port != 0, "port must be nonzero");
        ensure!(self.pool_size >= 1, "pool_size must be >= 1");
        Ok(())
    }
}

/// Serde helper for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_host() {
        let cfg = ClientConfig::new("", 11211);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_pool_size() {
        let mut cfg = ClientConfig::new("127.0.0.1", 11211);
        cfg.pool_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn accepts_defaults() {
        let cfg = ClientConfig::new("127.0.0.1", 11211);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.pool_size, 5);
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
        assert_eq!(cfg.op_timeout, Duration::from_secs(5));
    }
}
