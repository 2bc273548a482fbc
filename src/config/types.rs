//! Configuration types

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Binance-specific configuration
    #[serde(default)]
    pub binance: BinanceConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            binance: BinanceConfig::default(),
            settings: AppSettings::default(),
        }
    }
}

/// Binance USDT-M Futures configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceConfig {
    /// API key for authenticated requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// API secret for signing requests
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Whether to target the testnet (default) or production
    #[serde(default = "default_testnet")]
    pub testnet: bool,
    /// Base URL override; derived from `testnet` when absent
    #[serde(default)]
    pub rest_url: Option<String>,
}

impl BinanceConfig {
    /// Effective REST base URL
    pub fn base_url(&self) -> String {
        match &self.rest_url {
            Some(url) => url.clone(),
            None if self.testnet => default_testnet_rest_url(),
            None => default_prod_rest_url(),
        }
    }

    /// Whether both credentials are configured
    pub fn has_credentials(&self) -> bool {
        matches!((&self.api_key, &self.api_secret), (Some(k), Some(s)) if !k.is_empty() && !s.is_empty())
    }
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            testnet: default_testnet(),
            rest_url: None,
        }
    }
}

fn default_testnet() -> bool {
    true
}

fn default_testnet_rest_url() -> String {
    "https://testnet.binancefuture.com".to_string()
}

fn default_prod_rest_url() -> String {
    "https://fapi.binance.com".to_string()
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// OCO status poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// OCO monitoring budget in seconds before giving up with both legs open
    #[serde(default = "default_monitor_budget")]
    pub monitor_budget_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_timeout_seconds: default_request_timeout(),
            poll_interval_seconds: default_poll_interval(),
            monitor_budget_seconds: default_monitor_budget(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    3
}

fn default_monitor_budget() -> u64 {
    600
}

/// API credentials for authenticated requests
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    pub fn new(api_key: String, api_secret: String) -> Self {
        Self {
            api_key,
            api_secret,
        }
    }
}
