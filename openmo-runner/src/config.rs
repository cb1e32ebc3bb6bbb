//! Serializable run configuration, loaded from TOML.

use openmo_core::engine::{BrokerConfig, EngineConfig};
use openmo_core::{ParamsError, SessionClock, SessionConfig, SessionError, StrategyParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::bootstrap::{BootstrapConfig, BootstrapError};

/// Content-addressed identifier of a run configuration.
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize config TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("serialize config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("strategy: {0}")]
    Strategy(#[from] ParamsError),
    #[error("session: {0}")]
    Session(#[from] SessionError),
    #[error("broker: {name} must be finite and non-negative, got {value}")]
    Broker { name: &'static str, value: f64 },
    #[error("simulation: {0}")]
    Simulation(#[from] BootstrapError),
}

/// Everything needed to reproduce a backtest and its simulation.
///
/// Every section and field is optional in TOML; missing values take the
/// opening-momentum defaults (MNQ, $5000 account, $200 daily limit).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub strategy: StrategyParams,
    pub session: SessionConfig,
    pub broker: BrokerConfig,
    pub simulation: BootstrapConfig,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Fail fast on any setting that would make the run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        SessionClock::new(&self.session)?;
        for (name, value) in [
            ("starting_cash", self.broker.starting_cash),
            ("commission_per_contract", self.broker.commission_per_contract),
            ("slippage_pct", self.broker.slippage_pct),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Broker { name, value });
            }
        }
        self.simulation.validate()?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            params: self.strategy,
            session: self.session.clone(),
        }
    }

    /// Deterministic hash of the configuration; identical configs share an id.
    ///
    /// Hashes the JSON form: TOML integers stop at `i64::MAX` and the seed is a
    /// full `u64`.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
