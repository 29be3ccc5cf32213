//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Brokerage credentials are referenced by env-var name in the config and
//! resolved at runtime into a validated [`Credentials`] pair.

use alloy_primitives::Address;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::engine::poller::PollPolicy;
use crate::engine::workflow::WorkflowPlan;
use crate::types::RelayError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    pub workflow: WorkflowConfig,
    pub polling: PollingConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BrokerConfig {
    pub base_url: String,
    pub key_env: String,
    pub secret_env: String,
    pub request_timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://paper-api.alpaca.markets".to_string(),
            key_env: "ALPACA_KEY".to_string(),
            secret_env: "ALPACA_SECRET".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Asset sold in the first leg.
    pub source_symbol: String,
    /// Asset bought with the proceeds and then transferred out.
    pub intermediate_symbol: String,
    pub transfer_asset: String,
    pub destination_address: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            source_symbol: "TSLA".to_string(),
            intermediate_symbol: "USDCUSD".to_string(),
            transfer_asset: "USDCUSD".to_string(),
            destination_address: "0x7358D4CDF1c468aA018ec41ddD98b44879a10962".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub order_max_attempts: u32,
    pub transfer_max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            order_max_attempts: 10,
            transfer_max_attempts: 120,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Wall-clock limit imposed by the host environment, if known.
    pub host_budget_secs: Option<u64>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), RelayError> {
        let wf = &self.workflow;
        for (field, value) in [
            ("workflow.source_symbol", &wf.source_symbol),
            ("workflow.intermediate_symbol", &wf.intermediate_symbol),
            ("workflow.transfer_asset", &wf.transfer_asset),
            ("broker.base_url", &self.broker.base_url),
        ] {
            if value.trim().is_empty() {
                return Err(RelayError::Config(format!("{field} must not be empty")));
            }
        }

        Address::from_str(&wf.destination_address).map_err(|e| {
            RelayError::Config(format!(
                "workflow.destination_address is not a valid address: {e}"
            ))
        })?;

        if self.polling.order_max_attempts == 0 || self.polling.transfer_max_attempts == 0 {
            return Err(RelayError::Config(
                "polling attempt caps must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the workflow plan described by this config.
    pub fn workflow_plan(&self) -> WorkflowPlan {
        let interval = Duration::from_secs(self.polling.interval_secs);
        WorkflowPlan {
            source_symbol: self.workflow.source_symbol.clone(),
            intermediate_symbol: self.workflow.intermediate_symbol.clone(),
            transfer_asset: self.workflow.transfer_asset.clone(),
            destination_address: self.workflow.destination_address.clone(),
            order_poll: PollPolicy::new(interval, self.polling.order_max_attempts),
            transfer_poll: PollPolicy::new(interval, self.polling.transfer_max_attempts),
        }
    }

    /// Warn when the workflow's worst case cannot fit the host budget.
    /// Returns whether it fits.
    pub fn check_host_budget(&self) -> bool {
        let Some(budget_secs) = self.runtime.host_budget_secs else {
            return true;
        };
        let worst_case = self.workflow_plan().worst_case();
        let fits = worst_case <= Duration::from_secs(budget_secs);
        if !fits {
            warn!(
                worst_case_secs = worst_case.as_secs(),
                budget_secs,
                "Workflow worst case exceeds host time budget"
            );
        }
        fits
    }

    /// Resolve the brokerage credentials from the environment.
    pub fn credentials(&self) -> Result<Credentials, RelayError> {
        Credentials::new(
            Self::resolve_env(&self.broker.key_env),
            Self::resolve_env(&self.broker.secret_env),
        )
    }

    /// Resolve an environment variable name to its value. Unset reads as
    /// empty so the credential check reports it.
    pub fn resolve_env(env_name: &str) -> String {
        std::env::var(env_name).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Brokerage API key pair. Both halves are guaranteed non-empty.
pub struct Credentials {
    key: SecretString,
    secret: SecretString,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Result<Self, RelayError> {
        let key = key.into();
        let secret = secret.into();
        if key.is_empty() || secret.is_empty() {
            return Err(RelayError::Config("need alpaca keys".to_string()));
        }
        Ok(Self {
            key: SecretString::new(key),
            secret: SecretString::new(secret),
        })
    }

    pub fn key(&self) -> &str {
        self.key.expose_secret()
    }

    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"[REDACTED]")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
