//! CloudConvert v2 REST API access.
//!
//! [`CloudConvertClient`] wraps `reqwest` with base-URL selection, bearer
//! authentication and error normalization. Responses are resolved once into an
//! [`ApiResponse`] so call sites never probe for `data` themselves.

mod client;
mod types;

pub use client::{ApiRequest, CloudConvertClient};
pub use types::{id_string, ApiResponse, JobStatus, Links, Webhook, WebhookEvent};
