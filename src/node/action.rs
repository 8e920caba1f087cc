use super::operation::{CreateJob, JobOperation, Operation, Resource, WebhookOperation};
use super::params::NodeParameters;
use crate::api::{ApiRequest, CloudConvertClient};
use crate::exports;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cloudconvert_common::{BinaryMap, Error, NodeItem, Result};
use serde_json::{json, Map, Value};

/// Task name prefix of auto-generated import tasks.
pub const AUTOIMPORT_PREFIX: &str = "autoimport-";

const IMPORT_BASE64_OPERATION: &str = "import/base64";

/// What an execution emits.
///
/// As soon as one item produced binary attachments, the whole execution
/// emits only those binary items; otherwise every JSON record becomes an item.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    Json(Vec<NodeItem>),
    Binary(Vec<NodeItem>),
}

impl NodeOutput {
    pub fn items(&self) -> &[NodeItem] {
        match self {
            Self::Json(items) | Self::Binary(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<NodeItem> {
        match self {
            Self::Json(items) | Self::Binary(items) => items,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }
}

/// Outcome of one operation on one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationResult {
    /// JSON records to emit.
    pub records: Vec<Value>,
    /// Item carrying downloaded export files.
    pub binary_item: Option<NodeItem>,
}

impl OperationResult {
    fn records(records: Vec<Value>) -> Self {
        Self {
            records,
            binary_item: None,
        }
    }

    fn success() -> Self {
        Self::records(vec![json!({ "success": true })])
    }
}

/// Build the request body of a job creation.
///
/// The definition is used as-is, plus the optional tag, the asynchronous
/// completion webhook and one `import/base64` task per input attachment.
/// Existing tasks are never touched; an attachment named like an existing
/// `autoimport-*` task replaces that task.
pub fn build_job_body(create: &CreateJob, attachments: &BinaryMap) -> Result<Value> {
    let parsed: Value = serde_json::from_str(&create.definition)
        .map_err(|e| Error::invalid_definition(e.to_string()))?;

    let Value::Object(mut body) = parsed else {
        return Err(Error::invalid_definition("the definition must be a JSON object"));
    };

    if let Some(ref tag) = create.tag {
        body.insert("tag".to_string(), Value::String(tag.clone()));
    }

    if !create.sync {
        if let Some(ref url) = create.webhook_url {
            body.insert("webhook_url".to_string(), Value::String(url.clone()));
        }
    }

    if !attachments.is_empty() {
        let tasks = body
            .entry("tasks")
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(tasks) = tasks else {
            return Err(Error::invalid_definition("'tasks' must be a JSON object"));
        };

        for (name, binary) in attachments {
            let filename = binary.file_name.clone().unwrap_or_else(|| name.clone());
            tasks.insert(
                format!("{}{}", AUTOIMPORT_PREFIX, name),
                json!({
                    "operation": IMPORT_BASE64_OPERATION,
                    "file": STANDARD.encode(&binary.data),
                    "filename": filename,
                }),
            );
        }
    }

    Ok(Value::Object(body))
}

/// Dispatches resource/operation pairs to the CloudConvert API.
#[derive(Debug, Clone)]
pub struct CloudConvertNode {
    client: CloudConvertClient,
}

impl CloudConvertNode {
    pub fn new(client: CloudConvertClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CloudConvertClient {
        &self.client
    }

    /// Run the configured operation once per input item, in order.
    ///
    /// The first failing item aborts the execution.
    pub async fn execute(
        &self,
        items: &[NodeItem],
        params: &dyn NodeParameters,
    ) -> Result<NodeOutput> {
        let resource: Resource = params.string_or("resource", 0, "job").parse()?;
        let operation = params.string_or("operation", 0, resource.default_operation());

        let mut records = Vec::new();
        let mut binary_items = Vec::new();

        for (i, item) in items.iter().enumerate() {
            let op = Operation::resolve(params, resource, &operation, i)?;
            tracing::debug!(item = i, ?op, "Executing CloudConvert operation");

            let result = self.run(&op, item).await?;
            records.extend(result.records);
            binary_items.extend(result.binary_item);
        }

        if binary_items.is_empty() {
            Ok(NodeOutput::Json(
                records.into_iter().map(NodeItem::from_json).collect(),
            ))
        } else {
            Ok(NodeOutput::Binary(binary_items))
        }
    }

    /// Run a single resolved operation against one input item.
    pub async fn run(&self, op: &Operation, item: &NodeItem) -> Result<OperationResult> {
        match op {
            Operation::Job(JobOperation::List { tag, status }) => {
                let mut request = ApiRequest::get("/v2/jobs");
                if let Some(tag) = tag {
                    request = request.query("filter[tag]", tag.as_str());
                }
                if let Some(status) = status {
                    request = request.query("filter[status]", status.as_str());
                }
                Ok(OperationResult::records(
                    self.client.request_all(request).await?,
                ))
            }
            Operation::Job(JobOperation::Get { id }) => {
                let response = self
                    .client
                    .request(ApiRequest::get(format!("/v2/jobs/{}", id)))
                    .await?;
                Ok(OperationResult::records(response.into_items()))
            }
            Operation::Job(JobOperation::Delete { id }) => {
                self.client
                    .request(ApiRequest::delete(format!("/v2/jobs/{}", id)))
                    .await?;
                tracing::info!(job = %id, "Deleted job");
                Ok(OperationResult::success())
            }
            Operation::Job(JobOperation::Create(create)) => self.create_job(create, item).await,
            Operation::Webhook(WebhookOperation::List { url }) => {
                let mut request = ApiRequest::get("/v2/users/me/webhooks");
                if let Some(url) = url {
                    request = request.query("filter[url]", url.as_str());
                }
                let mut webhooks = self.client.request_all(request).await?;
                if let Some(url) = url {
                    webhooks.retain(|hook| hook.get("url").and_then(Value::as_str) == Some(url.as_str()));
                }
                Ok(OperationResult::records(webhooks))
            }
            Operation::Webhook(WebhookOperation::Delete { id }) => {
                self.client
                    .request(ApiRequest::delete(format!("/v2/webhooks/{}", id)))
                    .await?;
                tracing::info!(webhook = %id, "Deleted webhook");
                Ok(OperationResult::success())
            }
        }
    }

    async fn create_job(&self, create: &CreateJob, item: &NodeItem) -> Result<OperationResult> {
        let body = build_job_body(create, &item.binary)?;
        if !item.binary.is_empty() {
            tracing::debug!(count = item.binary.len(), "Importing input attachments");
        }

        let response = self
            .client
            .request(ApiRequest::post("/v2/jobs", body).sync(create.sync))
            .await?;
        let job = response.into_data();

        if let Some(id) = job.get("id").and_then(Value::as_str) {
            tracing::info!(job = %id, sync = create.sync, "Created job");
        }

        let binary_item = if create.sync && create.download && !job.is_null() {
            let mut binary_item = NodeItem::from_json(job.clone());
            exports::attach_exports(&self.client, &job, &mut binary_item).await?;
            Some(binary_item)
        } else {
            None
        };

        let records = match job {
            Value::Null => Vec::new(),
            job => vec![job],
        };

        Ok(OperationResult {
            records,
            binary_item,
        })
    }
}
