//! Store Settings
//!
//! Settings come from `SUPABASE_*` environment variables, with a `.env` file
//! in the working directory loaded first when present.

use config::{Config, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use supabase_rest::{SupabaseConfig, DEFAULT_TIMEOUT_MS};
use thiserror::Error;

/// Rows returned by history reads when no limit is given
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Failed to read .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    url: Option<String>,
    service_key: Option<String>,
    timeout_ms: u64,
    validate_inputs: bool,
    history_limit: usize,
}

/// Prediction store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend connection
    pub supabase: SupabaseConfig,
    /// Range-check records before inserting
    pub validate_inputs: bool,
    /// Default row limit for history reads
    pub history_limit: usize,
}

impl StoreConfig {
    /// Load from the process environment (`SUPABASE_URL`,
    /// `SUPABASE_SERVICE_KEY`, optional `SUPABASE_TIMEOUT_MS`,
    /// `SUPABASE_VALIDATE_INPUTS`, `SUPABASE_HISTORY_LIMIT`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars = match dotenvy::dotenv_iter() {
            Ok(iter) => iter.collect::<Result<HashMap<_, _>, _>>()?,
            // A missing .env file is normal in deployed environments
            Err(e) if e.not_found() => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Self::from_layers(vars)
    }

    /// Load with `path` as the `.env` file. Process variables take
    /// precedence over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let vars = dotenvy::from_path_iter(path)?.collect::<Result<HashMap<_, _>, _>>()?;
        Self::from_layers(vars)
    }

    /// Load from an explicit set of variables instead of the process
    /// environment
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::load(Environment::with_prefix("SUPABASE").source(Some(vars)))
    }

    fn from_layers(mut vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        vars.extend(std::env::vars());
        Self::from_map(vars)
    }

    fn load(env: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("timeout_ms", DEFAULT_TIMEOUT_MS as i64)?
            .set_default("validate_inputs", false)?
            .set_default("history_limit", DEFAULT_HISTORY_LIMIT as i64)?
            .add_source(env.try_parsing(true))
            .build()?;

        let raw: RawSettings = settings.try_deserialize()?;

        let url = raw.url.ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let service_key = raw
            .service_key
            .ok_or(ConfigError::Missing("SUPABASE_SERVICE_KEY"))?;

        Ok(Self {
            supabase: SupabaseConfig::new(url, service_key).with_timeout_ms(raw.timeout_ms),
            validate_inputs: raw.validate_inputs,
            history_limit: raw.history_limit,
        })
    }
}
