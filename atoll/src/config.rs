use std::{path::PathBuf, str::FromStr};

use standings::StandingsConfig;
use thiserror::Error;

const DEV_STATE_DIR: &str = "atoll.state";
const PROD_STATE_DIR: &str = "/var/lib/atoll";

/// Deployment target for the binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(ConfigError::UnknownEnvironment {
                value: other.to_string(),
            }),
        }
    }
}

/// Minimal configuration blob compiled into the binary.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub standings: StandingsConfig,
    pub status_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load(env: Environment) -> Result<Self, ConfigError> {
        let state_dir = match env {
            Environment::Dev => PathBuf::from(DEV_STATE_DIR),
            Environment::Prod => PathBuf::from(PROD_STATE_DIR),
        };
        let mut standings = StandingsConfig::new(state_dir);
        standings.label = env_label(env).to_string();
        Ok(Self {
            env,
            standings,
            status_log_interval_secs: 30,
        })
    }

    pub fn env_label(&self) -> &'static str {
        env_label(self.env)
    }

    pub fn population_path(&self) -> PathBuf {
        self.standings.state_dir().join("population.jsonl")
    }

    pub fn deny_list_path(&self) -> PathBuf {
        self.standings.state_dir().join("deny-list.json")
    }
}

fn env_label(env: Environment) -> &'static str {
    match env {
        Environment::Dev => "dev",
        Environment::Prod => "prod",
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown environment {value:?} (expected dev or prod)")]
    UnknownEnvironment { value: String },
}
