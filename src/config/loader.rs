//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{BotError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP_)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| BotError::Configuration(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| BotError::Configuration(e.to_string()))?;

    apply_credential_env(&mut app_config);

    Ok(app_config)
}

/// Overlay the well-known Binance credential variables
///
/// Testnet credentials are read from BINANCE_TESTNET_API_KEY /
/// BINANCE_TESTNET_SECRET_KEY, production from BINANCE_API_KEY /
/// BINANCE_SECRET_KEY, whichever matches the configured target.
fn apply_credential_env(config: &mut AppConfig) {
    let (key_var, secret_var) = if config.binance.testnet {
        ("BINANCE_TESTNET_API_KEY", "BINANCE_TESTNET_SECRET_KEY")
    } else {
        ("BINANCE_API_KEY", "BINANCE_SECRET_KEY")
    };

    if config.binance.api_key.is_none() {
        config.binance.api_key = std::env::var(key_var).ok();
    }
    if config.binance.api_secret.is_none() {
        config.binance.api_secret = std::env::var(secret_var).ok();
    }
}
