use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::{CartError, Result};

const SETTINGS_FILE: &str = "storefront.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub storefront_url: String,
    pub cart_add_path: String,
    pub cart_summary_path: String,
    /// Path of the page the cart lives on; sections are rendered against it.
    pub page_path: String,
    /// Wait between a mutation acknowledgment and the follow-up fragment fetch.
    pub settle_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storefront_url: "http://127.0.0.1:9292".into(),
            cart_add_path: "/cart/add.js".into(),
            cart_summary_path: "/cart.js".into(),
            page_path: "/".into(),
            settle_delay_ms: 200,
        }
    }
}

impl Settings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn storefront_base(&self) -> Result<Url> {
        let url = Url::parse(self.storefront_url.trim()).map_err(|err| {
            CartError::Config(format!(
                "storefront_url '{}' is not a valid url: {err}",
                self.storefront_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CartError::Config(
                "storefront_url must start with http:// or https://".into(),
            ));
        }
        Ok(url)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    storefront_url: Option<String>,
    cart_add_path: Option<String>,
    cart_summary_path: Option<String>,
    page_path: Option<String>,
    settle_delay_ms: Option<u64>,
}

pub fn load_settings() -> Settings {
    let settings = load_settings_from(Path::new(SETTINGS_FILE));
    apply_env_overrides(settings, |key| std::env::var(key).ok())
}

/// Reads `path` over the defaults. A missing or malformed file leaves the
/// defaults untouched.
pub fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();

    let Ok(raw) = fs::read_to_string(path) else {
        return settings;
    };
    let file_cfg = match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "ignoring malformed settings file");
            return settings;
        }
    };

    if let Some(v) = file_cfg.storefront_url {
        settings.storefront_url = v;
    }
    if let Some(v) = file_cfg.cart_add_path {
        settings.cart_add_path = v;
    }
    if let Some(v) = file_cfg.cart_summary_path {
        settings.cart_summary_path = v;
    }
    if let Some(v) = file_cfg.page_path {
        settings.page_path = v;
    }
    if let Some(v) = file_cfg.settle_delay_ms {
        settings.settle_delay_ms = v;
    }

    settings
}

pub fn apply_env_overrides(
    mut settings: Settings,
    var: impl Fn(&str) -> Option<String>,
) -> Settings {
    if let Some(v) = var("STOREFRONT_URL") {
        settings.storefront_url = v;
    }
    if let Some(v) = var("APP__STOREFRONT_URL") {
        settings.storefront_url = v;
    }
    if let Some(v) = var("APP__CART_ADD_PATH") {
        settings.cart_add_path = v;
    }
    if let Some(v) = var("APP__CART_SUMMARY_PATH") {
        settings.cart_summary_path = v;
    }
    if let Some(v) = var("APP__PAGE_PATH") {
        settings.page_path = v;
    }
    if let Some(v) = var("APP__SETTLE_DELAY_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.settle_delay_ms = parsed,
            Err(_) => tracing::warn!(value = %v, "ignoring non-numeric APP__SETTLE_DELAY_MS"),
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
