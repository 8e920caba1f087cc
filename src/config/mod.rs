mod types;

pub use types::*;

use crate::api::CloudConvertClient;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the configured API key.
pub const API_KEY_ENV: &str = "CLOUDCONVERT_API_KEY";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./cloudconvert.toml",
        "~/.config/cloudconvert/config.toml",
        "/etc/cloudconvert/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    apply_env(&mut config);
    Ok(config)
}

fn apply_env(config: &mut Config) {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.is_empty() {
            config.credentials.api_key = key;
        }
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.trigger.events.is_empty() {
        anyhow::bail!("Trigger must subscribe to at least one event");
    }

    if let Some(ref url) = config.server.public_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("Public URL must be an http(s) URL: {}", url);
        }
    }

    if config.credentials.api_key.is_empty() {
        tracing::warn!(
            "No CloudConvert API key configured (set credentials.api_key or {})",
            API_KEY_ENV
        );
    }

    Ok(())
}

/// Build an API client from the configuration.
pub fn build_client(config: &Config) -> CloudConvertClient {
    let credentials = config.credentials.to_credentials();
    let timeout = config.api.timeout_secs.map(Duration::from_secs);
    let client = CloudConvertClient::with_timeout(credentials.clone(), timeout);

    match (&config.api.base_url, &config.api.sync_base_url) {
        (None, None) => client,
        (api, sync) => client.with_base_urls(
            api.clone().unwrap_or_else(|| credentials.base_url(false)),
            sync.clone().unwrap_or_else(|| credentials.base_url(true)),
        ),
    }
}
