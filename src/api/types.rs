use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Pagination links of a list response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Links {
    #[serde(default)]
    pub next: Option<String>,
}

/// A response body, resolved once at the client boundary.
///
/// CloudConvert wraps most payloads as `{ "data": ..., "links": ... }`; a few
/// endpoints (and empty `204` bodies) return the value directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Envelope { data: Value, links: Links },
    Bare(Value),
}

impl ApiResponse {
    /// Classify a parsed body.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key("data") => {
                let data = map.remove("data").unwrap_or(Value::Null);
                let links = map
                    .remove("links")
                    .and_then(|links| serde_json::from_value(links).ok())
                    .unwrap_or_default();
                ApiResponse::Envelope { data, links }
            }
            other => ApiResponse::Bare(other),
        }
    }

    /// URL of the next page, if more pages exist.
    pub fn next_link(&self) -> Option<&str> {
        match self {
            ApiResponse::Envelope { links, .. } => links.next.as_deref(),
            ApiResponse::Bare(_) => None,
        }
    }

    /// The payload: `data` of an envelope or the bare value.
    pub fn into_data(self) -> Value {
        match self {
            ApiResponse::Envelope { data, .. } => data,
            ApiResponse::Bare(value) => value,
        }
    }

    /// The payload as a sequence of records.
    ///
    /// Arrays are flattened, `null` yields nothing, anything else is a single
    /// record.
    pub fn into_items(self) -> Vec<Value> {
        match self.into_data() {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        }
    }
}

/// Job status filter accepted by `GET /v2/jobs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Error,
    Finished,
    Processing,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Finished => "finished",
            Self::Processing => "processing",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "finished" => Ok(Self::Finished),
            "processing" => Ok(Self::Processing),
            other => Err(format!(
                "unknown job status '{}' (expected error, finished or processing)",
                other
            )),
        }
    }
}

/// Job lifecycle event a webhook can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    #[serde(rename = "job.created")]
    JobCreated,
    #[serde(rename = "job.finished")]
    JobFinished,
    #[serde(rename = "job.failed")]
    JobFailed,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JobCreated => "job.created",
            Self::JobFinished => "job.finished",
            Self::JobFailed => "job.failed",
        }
    }

    /// Events a new trigger subscribes to.
    pub fn defaults() -> Vec<WebhookEvent> {
        vec![Self::JobFinished, Self::JobFailed]
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job.created" => Ok(Self::JobCreated),
            "job.finished" => Ok(Self::JobFinished),
            "job.failed" => Ok(Self::JobFailed),
            other => Err(format!("unknown webhook event '{}'", other)),
        }
    }
}

/// A webhook subscription as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Webhook {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub signing_secret: Option<String>,
}

/// Render a JSON identifier as a path segment.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_string(&value).ok_or_else(|| serde::de::Error::custom("expected a string or numeric id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_with_next_link() {
        let resp = ApiResponse::from_value(json!({
            "data": [{ "id": "a" }],
            "links": { "next": "https://api.cloudconvert.com/v2/jobs?page=2" },
            "meta": { "current_page": 1 }
        }));
        assert_eq!(
            resp.next_link(),
            Some("https://api.cloudconvert.com/v2/jobs?page=2")
        );
        assert_eq!(resp.into_items(), vec![json!({ "id": "a" })]);
    }

    #[test]
    fn test_envelope_null_next_is_last_page() {
        let resp = ApiResponse::from_value(json!({
            "data": [],
            "links": { "next": null }
        }));
        assert_eq!(resp.next_link(), None);
        assert!(resp.into_items().is_empty());
    }

    #[test]
    fn test_bare_values() {
        let resp = ApiResponse::from_value(json!([{ "id": 1 }, { "id": 2 }]));
        assert_eq!(resp.next_link(), None);
        assert_eq!(resp.into_items().len(), 2);

        let resp = ApiResponse::from_value(json!({ "id": "job" }));
        assert_eq!(resp.clone().into_data(), json!({ "id": "job" }));
        assert_eq!(resp.into_items(), vec![json!({ "id": "job" })]);

        assert!(ApiResponse::from_value(Value::Null).into_items().is_empty());
    }

    #[test]
    fn test_job_status_parse() {
        assert_eq!("finished".parse::<JobStatus>(), Ok(JobStatus::Finished));
        assert!("done".parse::<JobStatus>().is_err());
        assert_eq!(JobStatus::Processing.to_string(), "processing");
    }

    #[test]
    fn test_webhook_event_serde() {
        let events: Vec<WebhookEvent> =
            serde_json::from_value(json!(["job.created", "job.failed"])).unwrap();
        assert_eq!(events, vec![WebhookEvent::JobCreated, WebhookEvent::JobFailed]);
        assert_eq!(
            serde_json::to_value(WebhookEvent::defaults()).unwrap(),
            json!(["job.finished", "job.failed"])
        );
    }

    #[test]
    fn test_webhook_numeric_id() {
        let hook: Webhook = serde_json::from_value(json!({
            "id": 42,
            "url": "https://example.com/hook",
            "events": ["job.finished"],
            "signing_secret": "s3cr3t"
        }))
        .unwrap();
        assert_eq!(hook.id, "42");
        assert_eq!(hook.signing_secret.as_deref(), Some("s3cr3t"));
    }
}
