//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defines the structs for the VK transport, the catalog service, and ticket formatting.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::domain::error::BotError;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub vk: VkConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub tickets: TicketsConfig,
    /// Canned command replies (lowercased label -> reply text), hot-reloadable.
    #[serde(default)]
    pub commands: HashMap<String, String>,
}

impl AppConfig {
    /// Loads the configuration from a YAML file.
    ///
    /// The access token may be left empty in the file and supplied through the
    /// `VK_ACCESS_TOKEN` environment variable instead, so the token never has
    /// to live on disk.
    pub fn load(path: &Path) -> Result<Self, BotError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BotError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut config: AppConfig = serde_yaml::from_str(&content).map_err(|e| {
            BotError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })?;

        if config.vk.access_token.is_empty() {
            if let Ok(token) = std::env::var("VK_ACCESS_TOKEN") {
                config.vk.access_token = token;
            }
        }

        Ok(config)
    }
}

/// Settings for the VK long-poll transport.
#[derive(Debug, Deserialize, Clone)]
pub struct VkConfig {
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Server-side hold of the long-poll request, seconds.
    #[serde(default = "default_poll_wait")]
    pub poll_wait: u64,
    /// Fixed delay before retrying after a transient poll failure, seconds.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: u64,
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            group_id: String::new(),
            access_token: String::new(),
            api_version: default_api_version(),
            poll_wait: default_poll_wait(),
            retry_backoff: default_retry_backoff(),
        }
    }
}

/// Settings for the external booking/catalog service.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_base")]
    pub base_url: String,
    #[serde(default = "default_site_id")]
    pub site_id: String,
    #[serde(default = "default_catalog_timeout")]
    pub timeout: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base(),
            site_id: default_site_id(),
            timeout: default_catalog_timeout(),
        }
    }
}

/// Thresholds and links used when formatting ticket replies.
#[derive(Debug, Deserialize, Clone)]
pub struct TicketsConfig {
    /// Price above which an unmarked tariff counts as an adult ticket.
    #[serde(default = "default_adult_price_threshold")]
    pub adult_price_threshold: f64,
    /// Sessions with fewer free seats than this are flagged as nearly full.
    #[serde(default = "default_few_seats_threshold")]
    pub few_seats_threshold: i64,
    /// How many calendar days the date picker offers.
    #[serde(default = "default_picker_days")]
    pub picker_days: u64,
    #[serde(default = "default_purchase_url")]
    pub purchase_url: String,
}

impl Default for TicketsConfig {
    fn default() -> Self {
        Self {
            adult_price_threshold: default_adult_price_threshold(),
            few_seats_threshold: default_few_seats_threshold(),
            picker_days: default_picker_days(),
            purchase_url: default_purchase_url(),
        }
    }
}

fn default_api_version() -> String {
    "5.131".to_string()
}
fn default_poll_wait() -> u64 {
    25
}
fn default_retry_backoff() -> u64 {
    3
}
fn default_catalog_base() -> String {
    "https://apigateway.nordciti.ru/v1/aqua".to_string()
}
fn default_site_id() -> String {
    "1".to_string()
}
fn default_catalog_timeout() -> u64 {
    15
}
fn default_adult_price_threshold() -> f64 {
    1000.0
}
fn default_few_seats_threshold() -> i64 {
    10
}
fn default_picker_days() -> u64 {
    5
}
fn default_purchase_url() -> String {
    "https://yes35.ru/aquapark/tickets".to_string()
}
