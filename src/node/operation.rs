use super::params::NodeParameters;
use crate::api::JobStatus;
use cloudconvert_common::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Resource the node operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Job,
    Webhook,
}

impl Resource {
    /// Operation used when none is configured.
    pub fn default_operation(&self) -> &'static str {
        match self {
            Self::Job => "create",
            Self::Webhook => "list",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Job => write!(f, "job"),
            Self::Webhook => write!(f, "webhook"),
        }
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "job" => Ok(Self::Job),
            "webhook" => Ok(Self::Webhook),
            other => Err(Error::invalid_parameter(
                "resource",
                format!("unknown resource '{}'", other),
            )),
        }
    }
}

/// Parameters of a job creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateJob {
    /// Job definition as JSON text.
    pub definition: String,
    pub tag: Option<String>,
    /// Wait for completion on the synchronous API host.
    pub sync: bool,
    /// Download export files of a synchronous job.
    pub download: bool,
    /// Extra completion webhook for asynchronous jobs.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOperation {
    Create(CreateJob),
    List {
        tag: Option<String>,
        status: Option<JobStatus>,
    },
    Get {
        id: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOperation {
    List { url: Option<String> },
    Delete { id: String },
}

/// A fully resolved resource/operation pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Job(JobOperation),
    Webhook(WebhookOperation),
}

impl Operation {
    /// Resolve the operation for one input item.
    pub fn resolve(
        params: &dyn NodeParameters,
        resource: Resource,
        operation: &str,
        item_index: usize,
    ) -> Result<Self> {
        let i = item_index;
        match (resource, operation) {
            (Resource::Job, "create") => {
                let definition = params
                    .string("definition", i)
                    .ok_or_else(|| Error::missing_parameter("definition"))?;

                Ok(Self::Job(JobOperation::Create(CreateJob {
                    definition,
                    tag: params.string("tag", i),
                    sync: params.boolean("sync", i, false)?,
                    download: params.boolean("download", i, false)?,
                    webhook_url: params.string("webhook_url", i),
                })))
            }
            (Resource::Job, "list") => {
                let options = params.collection("list_options", i)?;
                let text = |key: &str| {
                    options
                        .get(key)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                };

                let status = text("status")
                    .map(|s| {
                        s.parse::<JobStatus>()
                            .map_err(|reason| Error::invalid_parameter("status", reason))
                    })
                    .transpose()?;

                Ok(Self::Job(JobOperation::List {
                    tag: text("tag"),
                    status,
                }))
            }
            (Resource::Job, "get") => Ok(Self::Job(JobOperation::Get {
                id: required(params, "jobId", i)?,
            })),
            (Resource::Job, "delete") => Ok(Self::Job(JobOperation::Delete {
                id: required(params, "jobId", i)?,
            })),
            (Resource::Webhook, "list") => Ok(Self::Webhook(WebhookOperation::List {
                url: params.string("webhook_url", i),
            })),
            (Resource::Webhook, "delete") => Ok(Self::Webhook(WebhookOperation::Delete {
                id: required(params, "webhook_id", i)?,
            })),
            (resource, operation) => Err(Error::unsupported(resource.to_string(), operation)),
        }
    }
}

fn required(params: &dyn NodeParameters, name: &str, item_index: usize) -> Result<String> {
    params
        .string(name, item_index)
        .ok_or_else(|| Error::missing_parameter(name))
}
