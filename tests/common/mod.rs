//! Shared helpers for integration tests.
//!
//! Every test stubs CloudConvert with a [`MockServer`]; the synchronous API
//! host is mounted under `/sync` on the same server so requests to the two
//! hosts can be told apart.

#![allow(dead_code)]

use cloudconvert_node::api::CloudConvertClient;
use cloudconvert_node::credentials::Credentials;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "test-key";

/// Path prefix standing in for the synchronous API host.
pub const SYNC_PREFIX: &str = "/sync";

/// Value of the Authorization header for [`API_KEY`].
pub fn bearer() -> String {
    format!("Bearer {}", API_KEY)
}

/// Client whose API hosts point at `server`.
pub fn client(server: &MockServer) -> CloudConvertClient {
    CloudConvertClient::new(Credentials::new(API_KEY, false))
        .with_base_urls(server.uri(), format!("{}{}", server.uri(), SYNC_PREFIX))
}

/// A finished job with one `export/url` task per `(task, files)` entry.
///
/// Files are `(filename, path)` pairs; `path` is resolved against `server`.
pub fn finished_job(server: &MockServer, exports: &[(&str, Vec<(&str, &str)>)]) -> Value {
    let mut tasks = vec![json!({
        "id": "t-convert",
        "name": "convert-1",
        "operation": "convert",
        "status": "finished",
        "result": { "files": [] }
    })];

    for (name, files) in exports {
        let files: Vec<Value> = files
            .iter()
            .map(|(filename, path)| {
                json!({ "filename": filename, "url": format!("{}{}", server.uri(), path) })
            })
            .collect();
        tasks.push(json!({
            "id": format!("t-{}", name),
            "name": name,
            "operation": "export/url",
            "status": "finished",
            "result": { "files": files }
        }));
    }

    json!({ "id": "job-1", "tag": "test", "status": "finished", "tasks": tasks })
}
