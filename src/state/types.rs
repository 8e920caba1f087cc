use super::StaticDataStore;
use crate::api::id_string;
use cloudconvert_common::Result;
use serde_json::Value;

/// Static-data key holding the subscription id.
pub const WEBHOOK_ID_KEY: &str = "webhookId";

/// Static-data key holding the subscription signing secret.
pub const WEBHOOK_SECRET_KEY: &str = "webhookSigningSecret";

/// The webhook subscription a trigger owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRegistration {
    pub webhook_id: String,
    pub signing_secret: Option<String>,
}

impl WebhookRegistration {
    pub fn new<S: Into<String>>(webhook_id: S, signing_secret: Option<String>) -> Self {
        Self {
            webhook_id: webhook_id.into(),
            signing_secret,
        }
    }

    /// Read the registration recorded in `store`, if any.
    pub fn load(store: &dyn StaticDataStore) -> Option<Self> {
        let webhook_id = store.get(WEBHOOK_ID_KEY).as_ref().and_then(id_string)?;
        let signing_secret = store
            .get(WEBHOOK_SECRET_KEY)
            .and_then(|v| v.as_str().map(str::to_string));

        Some(Self {
            webhook_id,
            signing_secret,
        })
    }

    /// Record this registration, replacing any previous one.
    pub fn save(&self, store: &dyn StaticDataStore) -> Result<()> {
        store.set(WEBHOOK_ID_KEY, Value::String(self.webhook_id.clone()))?;
        match self.signing_secret {
            Some(ref secret) => store.set(WEBHOOK_SECRET_KEY, Value::String(secret.clone())),
            None => store.remove(WEBHOOK_SECRET_KEY),
        }
    }

    /// Forget any recorded registration.
    pub fn clear(store: &dyn StaticDataStore) -> Result<()> {
        store.remove(WEBHOOK_ID_KEY)?;
        store.remove(WEBHOOK_SECRET_KEY)
    }
}
