//! Download the results of `export/url` tasks as binary attachments.
//!
//! A finished job lists its tasks with their results; every `export/url`
//! task exposes a list of files with temporary download URLs. Each file is
//! fetched sequentially and stored under `<taskName>_<index>`.
//!
//! The index does not advance between the files of one task: every file is
//! stored as `<taskName>_0` and a later file replaces an earlier one, so a
//! task yields exactly one attachment.

use crate::api::CloudConvertClient;
use cloudconvert_common::{BinaryMap, Error, NodeItem, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Operation name of tasks whose results are downloaded.
pub const EXPORT_URL_OPERATION: &str = "export/url";

/// One file produced by an export task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExportFile {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// An `export/url` task and its files.
///
/// Tasks from an array keep API order; tasks from a name map are ordered by
/// name, since JSON object order is not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTask {
    pub name: String,
    pub files: Vec<ExportFile>,
}

#[derive(Debug, Deserialize)]
struct Task {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    operation: Option<String>,
    #[serde(default)]
    result: Option<TaskResult>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskResult {
    #[serde(default)]
    files: Vec<ExportFile>,
}

/// Jobs from the API carry a task array; job definitions use a name map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaskSet {
    List(Vec<Task>),
    Named(BTreeMap<String, Task>),
}

/// Attachment key of an export file.
pub fn attachment_name(task_name: &str, index: usize) -> String {
    format!("{}_{}", task_name, index)
}

/// Select the `export/url` tasks of a job.
///
/// A task array is walked in order, a name map in name order.
pub fn export_tasks(job: &Value) -> Result<Vec<ExportTask>> {
    let Some(tasks) = job.get("tasks").filter(|t| !t.is_null()) else {
        return Ok(Vec::new());
    };

    let tasks: TaskSet = serde_json::from_value(tasks.clone())
        .map_err(|e| Error::invalid_response(format!("unreadable job tasks: {}", e)))?;

    let named: Vec<(String, Task)> = match tasks {
        TaskSet::List(list) => list
            .into_iter()
            .map(|task| (task.name.clone().unwrap_or_default(), task))
            .collect(),
        TaskSet::Named(map) => map.into_iter().collect(),
    };

    Ok(named
        .into_iter()
        .filter(|(_, task)| task.operation.as_deref() == Some(EXPORT_URL_OPERATION))
        .map(|(name, task)| ExportTask {
            name,
            files: task.result.unwrap_or_default().files,
        })
        .collect())
}

/// Download every export file of `job`.
pub async fn download_exports(client: &CloudConvertClient, job: &Value) -> Result<BinaryMap> {
    let mut binaries = BinaryMap::new();

    for task in export_tasks(job)? {
        for file in &task.files {
            let Some(ref url) = file.url else {
                tracing::warn!(task = %task.name, "Export file has no URL, skipping");
                continue;
            };

            let mut data = client.download(url).await?;
            data.file_name = file.filename.clone();

            let key = attachment_name(&task.name, 0);
            tracing::debug!(attachment = %key, bytes = data.len(), "Downloaded export file");
            binaries.insert(key, data);
        }
    }

    Ok(binaries)
}

/// Download the exports of `job` and merge them into `item`.
pub async fn attach_exports(
    client: &CloudConvertClient,
    job: &Value,
    item: &mut NodeItem,
) -> Result<()> {
    let binaries = download_exports(client, job).await?;
    tracing::info!(count = binaries.len(), "Attached export files");
    item.binary.extend(binaries);
    Ok(())
}
