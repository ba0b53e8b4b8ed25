//! Configuration management
//!
//! settings.json layout:
//! ```json
//! {
//!   "app": { ... },
//!   "gateway": {
//!     "merchantId": "m-1020",
//!     "webhookSecret": "...",
//!     "checkoutSecret": "...",
//!     "checkoutBaseUrl": "https://pay.example.com/checkout"
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    gateway: GatewaySettings,
}

/// Application settings the CLI does not manage; preserved verbatim
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AppSettings {
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Payment-gateway credentials and endpoints
///
/// Two independent shared secrets: `checkout_secret` signs outbound
/// checkout URLs, `webhook_secret` verifies inbound settlement webhooks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewaySettings {
    #[serde(default)]
    pub merchant_id: String,
    #[serde(default)]
    pub webhook_secret: String,
    #[serde(default)]
    pub checkout_secret: String,
    #[serde(default)]
    pub checkout_base_url: String,
}

impl GatewaySettings {
    /// True once every field needed to talk to the gateway is present
    pub fn is_configured(&self) -> bool {
        !self.merchant_id.is_empty()
            && !self.webhook_secret.is_empty()
            && !self.checkout_secret.is_empty()
            && !self.checkout_base_url.is_empty()
    }
}

/// Payline configuration (simplified view of settings)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gateway: GatewaySettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the payline directory
    pub fn load(payline_dir: &Path) -> Result<Self> {
        let settings_path = payline_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        Ok(Self {
            gateway: raw.gateway.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the payline directory
    /// Preserves settings that the CLI doesn't manage
    pub fn save(&self, payline_dir: &Path) -> Result<()> {
        let settings_path = payline_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        // Update only the fields we manage
        settings.gateway = self.gateway.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(!config.gateway.is_configured());
    }

    #[test]
    fn test_save_and_reload_gateway_settings() {
        let dir = tempdir().unwrap();
        let mut config = Config::load(dir.path()).unwrap();
        config.gateway = GatewaySettings {
            merchant_id: "m-1020".to_string(),
            webhook_secret: "hook-secret".to_string(),
            checkout_secret: "checkout-secret".to_string(),
            checkout_base_url: "https://pay.example.com/checkout".to_string(),
        };
        config.save(dir.path()).unwrap();

        let reloaded = Config::load(dir.path()).unwrap();
        assert_eq!(reloaded.gateway.merchant_id, "m-1020");
        assert!(reloaded.gateway.is_configured());
    }

    #[test]
    fn test_save_preserves_unmanaged_fields() {
        let dir = tempdir().unwrap();
        let settings_path = dir.path().join("settings.json");
        std::fs::write(
            &settings_path,
            r#"{"app": {"demoMode": true, "theme": "dark"}, "gateway": {}}"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        config.save(dir.path()).unwrap();

        let content = std::fs::read_to_string(&settings_path).unwrap();
        let saved: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(saved["app"]["theme"], "dark");
        assert_eq!(saved["app"]["demoMode"], true);
    }
}
