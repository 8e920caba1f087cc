//! The CloudConvert webhook trigger.
//!
//! The host drives a trigger through four hooks: `check_exists` and `create`
//! on activation, `delete` on deactivation and `webhook` for every inbound
//! delivery. The subscription id and signing secret live in the host's
//! per-node static data between those calls.

mod signature;

pub use signature::{sign, verify_signature, SIGNATURE_HEADER};

use crate::api::{ApiRequest, CloudConvertClient, Webhook, WebhookEvent};
use crate::exports;
use crate::node::NodeParameters;
use crate::state::{StaticDataStore, WebhookRegistration};
use async_trait::async_trait;
use bytes::Bytes;
use cloudconvert_common::{Error, NodeItem, Result};
use serde::Deserialize;
use serde_json::{json, Value};

/// Event after which export files can be downloaded.
const JOB_FINISHED: &str = "job.finished";

/// Trigger options chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSettings {
    /// Events the subscription is created for.
    pub events: Vec<WebhookEvent>,
    /// Download export files of finished jobs.
    pub download: bool,
    /// Drop deliveries whose signature does not match.
    pub verify: bool,
    /// Used when the subscription's own secret is unknown.
    pub signing_secret: Option<String>,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            events: WebhookEvent::defaults(),
            download: false,
            verify: false,
            signing_secret: None,
        }
    }
}

impl TriggerSettings {
    /// Settings from the host's trigger parameters.
    ///
    /// An empty or unset `events` list subscribes to the default events.
    pub fn from_parameters(params: &dyn NodeParameters) -> Result<Self> {
        let names = params.string_list("events", 0)?;
        let events = if names.is_empty() {
            WebhookEvent::defaults()
        } else {
            names
                .iter()
                .map(|name| {
                    name.parse::<WebhookEvent>()
                        .map_err(|reason| Error::invalid_parameter("events", reason))
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(Self {
            events,
            download: params.boolean("download", 0, false)?,
            verify: params.boolean("verify", 0, false)?,
            signing_secret: params.string("signing_secret", 0),
        })
    }
}

/// What a lifecycle hook gets from the host.
#[derive(Clone, Copy)]
pub struct HookContext<'a> {
    /// Public URL CloudConvert should call.
    pub webhook_url: &'a str,
    pub static_data: &'a dyn StaticDataStore,
}

impl<'a> HookContext<'a> {
    pub fn new(webhook_url: &'a str, static_data: &'a dyn StaticDataStore) -> Self {
        Self {
            webhook_url,
            static_data,
        }
    }
}

/// An inbound delivery.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    /// Value of the `CloudConvert-Signature` header.
    pub signature: Option<String>,
    /// Raw request body.
    pub body: Bytes,
}

impl WebhookRequest {
    pub fn new<B: Into<Bytes>>(body: B) -> Self {
        Self {
            signature: None,
            body: body.into(),
        }
    }

    pub fn with_signature<S: Into<String>>(mut self, signature: S) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// Items emitted for a delivery; empty when the delivery was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookResponse {
    pub items: Vec<NodeItem>,
}

impl WebhookResponse {
    pub fn dropped() -> Self {
        Self::default()
    }

    pub fn is_dropped(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Default, Deserialize)]
struct DeliveryPayload {
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    job: Option<Value>,
}

/// Host hooks of a webhook-driven trigger.
#[async_trait]
pub trait WebhookLifecycle: Send + Sync {
    /// Whether a subscription for the context's URL already exists.
    async fn check_exists(&self, ctx: &HookContext<'_>) -> Result<bool>;

    /// Create the subscription.
    async fn create(&self, ctx: &HookContext<'_>) -> Result<bool>;

    /// Remove the subscription. Upstream failures are reported as `false`.
    async fn delete(&self, ctx: &HookContext<'_>) -> Result<bool>;

    /// Handle one inbound delivery.
    async fn webhook(&self, ctx: &HookContext<'_>, request: WebhookRequest)
        -> Result<WebhookResponse>;

    /// Activation: reuse an existing subscription or create one.
    async fn activate(&self, ctx: &HookContext<'_>) -> Result<bool> {
        if self.check_exists(ctx).await? {
            return Ok(true);
        }
        self.create(ctx).await
    }
}

/// Local callback URLs are never registered upstream.
pub fn is_local_url(url: &str) -> bool {
    url.strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .is_some_and(|rest| rest.starts_with("localhost"))
}

/// Trigger receiving CloudConvert job events.
#[derive(Debug, Clone)]
pub struct CloudConvertTrigger {
    client: CloudConvertClient,
    settings: TriggerSettings,
}

impl CloudConvertTrigger {
    pub fn new(client: CloudConvertClient, settings: TriggerSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &TriggerSettings {
        &self.settings
    }

    fn signing_secret(&self, ctx: &HookContext<'_>) -> Option<String> {
        WebhookRegistration::load(ctx.static_data)
            .and_then(|reg| reg.signing_secret)
            .or_else(|| self.settings.signing_secret.clone())
            .filter(|s| !s.is_empty())
    }
}

#[async_trait]
impl WebhookLifecycle for CloudConvertTrigger {
    async fn check_exists(&self, ctx: &HookContext<'_>) -> Result<bool> {
        if is_local_url(ctx.webhook_url) {
            tracing::debug!(url = %ctx.webhook_url, "Skipping lookup of local webhook");
            return Ok(true);
        }

        let webhooks = self
            .client
            .request_all(
                ApiRequest::get("/v2/users/me/webhooks").query("filter[url]", ctx.webhook_url),
            )
            .await?;

        let existing = webhooks
            .into_iter()
            .filter(|hook| hook.get("url").and_then(Value::as_str) == Some(ctx.webhook_url))
            .find_map(|hook| serde_json::from_value::<Webhook>(hook).ok());

        match existing {
            Some(hook) => {
                tracing::info!(webhook = %hook.id, "Found existing webhook subscription");
                WebhookRegistration::new(hook.id, hook.signing_secret).save(ctx.static_data)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create(&self, ctx: &HookContext<'_>) -> Result<bool> {
        if is_local_url(ctx.webhook_url) {
            tracing::debug!(url = %ctx.webhook_url, "Skipping registration of local webhook");
            return Ok(true);
        }

        let events: Vec<&str> = self.settings.events.iter().map(|e| e.as_str()).collect();
        let response = self
            .client
            .request(ApiRequest::post(
                "/v2/webhooks",
                json!({ "url": ctx.webhook_url, "events": events }),
            ))
            .await?;

        match serde_json::from_value::<Webhook>(response.into_data()) {
            Ok(hook) => {
                tracing::info!(webhook = %hook.id, ?events, "Created webhook subscription");
                WebhookRegistration::new(hook.id, hook.signing_secret).save(ctx.static_data)?;
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Webhook creation returned no id: {}", e);
                Ok(false)
            }
        }
    }

    async fn delete(&self, ctx: &HookContext<'_>) -> Result<bool> {
        let Some(registration) = WebhookRegistration::load(ctx.static_data) else {
            WebhookRegistration::clear(ctx.static_data)?;
            return Ok(true);
        };

        let outcome = self
            .client
            .request(ApiRequest::delete(format!(
                "/v2/webhooks/{}",
                registration.webhook_id
            )))
            .await;

        WebhookRegistration::clear(ctx.static_data)?;

        match outcome {
            Ok(_) => {
                tracing::info!(webhook = %registration.webhook_id, "Deleted webhook subscription");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    webhook = %registration.webhook_id,
                    "Failed to delete webhook subscription: {}",
                    e
                );
                Ok(false)
            }
        }
    }

    async fn webhook(
        &self,
        ctx: &HookContext<'_>,
        request: WebhookRequest,
    ) -> Result<WebhookResponse> {
        if self.settings.verify {
            if let Some(secret) = self.signing_secret(ctx) {
                let valid = request
                    .signature
                    .as_deref()
                    .is_some_and(|sig| verify_signature(&secret, &request.body, sig));

                if !valid {
                    tracing::warn!("Received webhook has invalid signature, skipping");
                    return Ok(WebhookResponse::dropped());
                }
            }
        }

        let payload: Value = serde_json::from_slice(&request.body)
            .map_err(|e| Error::invalid_response(format!("webhook body is not JSON: {}", e)))?;
        let delivery: DeliveryPayload =
            serde_json::from_value(payload.clone()).unwrap_or_default();

        tracing::info!(event = delivery.event.as_deref().unwrap_or("unknown"), "Received webhook");

        let mut item = NodeItem::from_json(payload);

        if self.settings.download && delivery.event.as_deref() == Some(JOB_FINISHED) {
            if let Some(job) = delivery.job.filter(Value::is_object) {
                exports::attach_exports(&self.client, &job, &mut item).await?;
            }
        }

        Ok(WebhookResponse { items: vec![item] })
    }
}
