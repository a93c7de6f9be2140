// Copyright 2025 bgpgg Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::{Duration, SystemTime};

/// Peer configuration, as accepted by the engine and as found in the YAML
/// config file.
///
/// `address` is the identity key and cannot change after creation; every
/// other field is replaced wholesale by an update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeerConfig {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub local_asn: u32,
    #[serde(default)]
    pub remote_asn: u32,
    /// TCP MD5 shared secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// eBGP multihop TTL. 0 means directly connected.
    #[serde(default)]
    pub multihop: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_map_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_map_out: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_list_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_list_out: Option<String>,
    /// Maximum prefixes accepted from the peer. 0 means unlimited.
    #[serde(default)]
    pub max_prefix: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_pref: Option<u32>,
    /// Set by the engine when the peer is added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<SystemTime>,
    /// Set by the engine on add and on every update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<SystemTime>,
}

impl PeerConfig {
    /// Minimal configuration with the required fields set.
    pub fn new(address: &str, local_asn: u32, remote_asn: u32) -> Self {
        PeerConfig {
            address: address.to_string(),
            local_asn,
            remote_asn,
            ..Default::default()
        }
    }

    /// Check required fields. Addresses are opaque keys, so anything
    /// containing whitespace is rejected rather than normalised.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.address.is_empty() {
            return Err(EngineError::Validation("address is required".to_string()));
        }
        if self.address.chars().any(char::is_whitespace) {
            return Err(EngineError::Validation(format!(
                "address {:?} contains whitespace",
                self.address
            )));
        }
        if self.local_asn == 0 {
            return Err(EngineError::Validation(
                "local_asn must be non-zero".to_string(),
            ));
        }
        if self.remote_asn == 0 {
            return Err(EngineError::Validation(
                "remote_asn must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the session is eBGP (different AS on each end).
    pub fn is_ebgp(&self) -> bool {
        self.local_asn != self.remote_asn
    }
}

/// The settings the engine reads once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Time spent in each state before advancing to the next.
    pub transition_delay: Duration,
    /// Reject every mutating call with `SimulatedFailure`.
    pub fault_injection: bool,
}

impl EngineConfig {
    pub fn new(transition_delay: Duration, fault_injection: bool) -> Self {
        EngineConfig {
            transition_delay,
            fault_injection,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            transition_delay: Duration::from_millis(default_transition_delay_ms()),
            fault_injection: false,
        }
    }
}

/// Daemon configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_transition_delay_ms")]
    pub transition_delay_ms: u64,
    #[serde(default)]
    pub fault_injection: bool,
    /// Log level: "error", "warn", "info" (default), "debug", "trace"
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// How often the daemon polls for session changes to report.
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
    /// Peers added at startup
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
}

fn default_transition_delay_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_watch_interval_ms() -> u64 {
    500
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// A zero delay would collapse state entry times onto each other.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.transition_delay_ms == 0 {
            return Err(EngineError::Validation(
                "transition_delay_ms must be at least 1".to_string(),
            ));
        }
        for peer in &self.peers {
            peer.validate()?;
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(
            Duration::from_millis(self.transition_delay_ms),
            self.fault_injection,
        )
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            transition_delay_ms: default_transition_delay_ms(),
            fault_injection: false,
            log_level: default_log_level(),
            watch_interval_ms: default_watch_interval_ms(),
            peers: Vec::new(),
        }
    }
}
