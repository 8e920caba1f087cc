use crate::api::WebhookEvent;
use crate::credentials::Credentials;
use crate::trigger::TriggerSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialsConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub trigger: TriggerConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    /// CloudConvert API key (overridden by CLOUDCONVERT_API_KEY)
    #[serde(default)]
    pub api_key: String,

    /// Whether the key belongs to the sandbox environment
    #[serde(default)]
    pub sandbox: bool,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("api_key", &"<redacted>")
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

impl CredentialsConfig {
    pub fn to_credentials(&self) -> Credentials {
        Credentials::new(self.api_key.clone(), self.sandbox)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Replaces https://api.{sandbox.}cloudconvert.com
    #[serde(default)]
    pub base_url: Option<String>,

    /// Replaces https://sync.api.{sandbox.}cloudconvert.com
    #[serde(default)]
    pub sync_base_url: Option<String>,

    /// Overall request timeout; unset keeps the transport default
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerConfig {
    #[serde(default = "default_events")]
    pub events: Vec<WebhookEvent>,

    /// Download export files of finished jobs
    #[serde(default)]
    pub download: bool,

    /// Drop deliveries with an invalid signature
    #[serde(default)]
    pub verify: bool,

    /// Secret used when the subscription's own secret is unknown
    #[serde(default)]
    pub signing_secret: Option<String>,
}

fn default_events() -> Vec<WebhookEvent> {
    WebhookEvent::defaults()
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            events: default_events(),
            download: false,
            verify: false,
            signing_secret: None,
        }
    }
}

impl TriggerConfig {
    pub fn to_settings(&self) -> TriggerSettings {
        TriggerSettings {
            events: self.events.clone(),
            download: self.download,
            verify: self.verify,
            signing_secret: self.signing_secret.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Public URL CloudConvert delivers webhooks to
    #[serde(default)]
    pub public_url: Option<String>,

    /// Where the webhook subscription is remembered between runs
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Where downloaded attachments are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5680
}
fn default_state_file() -> PathBuf {
    PathBuf::from("./cloudconvert-state.json")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            state_file: default_state_file(),
            output_dir: default_output_dir(),
        }
    }
}
