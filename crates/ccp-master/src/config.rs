//! Master and connection configuration.
//!
//! ```yaml
//! poll_interval_ms: 1
//! timeouts:
//!   BUILD_CHKSUM: 60000
//! connections:
//!   - name: engine_ecu
//!     station_address: 0x0039
//!     cro_id: 0x7E0
//!     dto_id: 0x7E1
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use ccp_protocol::CommandCode;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default slice the transaction engine waits on the transport per poll.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// Identifiers of one slave station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Name used in logs and metric labels.
    pub name: String,
    /// Station address sent with CONNECT, TEST and DISCONNECT.
    pub station_address: u16,
    /// CAN identifier of command frames sent to the slave.
    pub cro_id: u32,
    /// CAN identifier of response frames sent by the slave.
    pub dto_id: u32,
}

impl ConnectionConfig {
    /// Create a connection configuration.
    pub fn new(name: impl Into<String>, station_address: u16, cro_id: u32, dto_id: u32) -> Self {
        ConnectionConfig {
            name: name.into(),
            station_address,
            cro_id,
            dto_id,
        }
    }
}

/// Configuration of the master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterConfig {
    /// Longest single wait on the transport while awaiting a response.
    pub poll_interval_ms: u64,
    /// Per-command timeout overrides in milliseconds.
    pub timeouts: BTreeMap<CommandCode, u64>,
    /// Stations to talk to.
    pub connections: Vec<ConnectionConfig>,
}

impl Default for MasterConfig {
    fn default() -> Self {
        MasterConfig {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeouts: BTreeMap::new(),
            connections: Vec::new(),
        }
    }
}

impl MasterConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: MasterConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be at least 1".into()));
        }
        if let Some((code, _)) = self.timeouts.iter().find(|(_, ms)| **ms == 0) {
            return Err(ConfigError::Invalid(format!("timeout for {} must be at least 1 ms", code)));
        }

        let mut names = HashSet::new();
        let mut dto_ids = HashSet::new();
        for conn in &self.connections {
            if !names.insert(conn.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate connection name '{}'", conn.name)));
            }
            if !dto_ids.insert(conn.dto_id) {
                return Err(ConfigError::Invalid(format!(
                    "connection '{}' reuses response identifier 0x{:X}",
                    conn.name, conn.dto_id
                )));
            }
            if conn.cro_id == conn.dto_id {
                return Err(ConfigError::Invalid(format!(
                    "connection '{}' uses 0x{:X} for both directions",
                    conn.name, conn.cro_id
                )));
            }
        }
        Ok(())
    }

    /// Look up a connection by name.
    pub fn connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// The poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Timeout table with this configuration's overrides applied.
    pub fn timeout_table(&self) -> TimeoutTable {
        TimeoutTable {
            overrides: self.timeouts.clone(),
        }
    }
}

/// Response timeout per command.
///
/// Falls back to the CCP 2.1 values of [`CommandCode::timeout`].
#[derive(Debug, Clone, Default)]
pub struct TimeoutTable {
    overrides: BTreeMap<CommandCode, u64>,
}

impl TimeoutTable {
    /// Override the timeout of one command.
    pub fn with_override(mut self, command: CommandCode, timeout: Duration) -> Self {
        self.overrides.insert(command, timeout.as_millis() as u64);
        self
    }

    /// Timeout for `command`.
    pub fn get(&self, command: CommandCode) -> Duration {
        match self.overrides.get(&command) {
            Some(ms) => Duration::from_millis(*ms),
            None => command.timeout(),
        }
    }
}
