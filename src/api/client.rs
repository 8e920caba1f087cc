use super::types::ApiResponse;
use crate::credentials::{Credentials, TEST_REQUEST_PATH};
use cloudconvert_common::{BinaryData, Error, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// A single call against the CloudConvert API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Route through the synchronous API host.
    pub sync: bool,
}

impl ApiRequest {
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            sync: false,
        }
    }

    pub fn get<P: Into<String>>(path: P) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post<P: Into<String>>(path: P, body: Value) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    pub fn delete<P: Into<String>>(path: P) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter.
    pub fn query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// Error body CloudConvert returns on failures.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Authenticated client for the CloudConvert v2 API.
#[derive(Debug, Clone)]
pub struct CloudConvertClient {
    client: Client,
    credentials: Credentials,
    api_base: String,
    sync_base: String,
}

impl CloudConvertClient {
    /// Create a client using the transport's default timeouts.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_timeout(credentials, None)
    }

    /// Create a client with an optional overall request timeout.
    pub fn with_timeout(credentials: Credentials, timeout: Option<Duration>) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with timeout: {}", e);
            Client::new()
        });

        Self {
            client,
            api_base: credentials.base_url(false),
            sync_base: credentials.base_url(true),
            credentials,
        }
    }

    /// Replace the API hosts derived from the credentials.
    pub fn with_base_urls<A: Into<String>, S: Into<String>>(mut self, api: A, sync: S) -> Self {
        self.api_base = api.into().trim_end_matches('/').to_string();
        self.sync_base = sync.into().trim_end_matches('/').to_string();
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Base URL a request is sent to.
    pub fn base_url(&self, sync: bool) -> &str {
        if sync {
            &self.sync_base
        } else {
            &self.api_base
        }
    }

    fn url(&self, path: &str, sync: bool) -> String {
        format!("{}{}", self.base_url(sync), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTHORIZATION, self.credentials.bearer())
    }

    /// Execute a single request.
    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path, request.sync);
        tracing::debug!(method = %request.method, url = %url, "CloudConvert request");

        let mut builder = self.authorized(self.client.request(request.method, &url));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        self.send(builder).await
    }

    /// Execute a list request and follow `links.next` until exhausted.
    ///
    /// Pages are concatenated in link order. There is no page limit: an
    /// upstream that always returns a next link loops forever.
    pub async fn request_all(&self, request: ApiRequest) -> Result<Vec<Value>> {
        let mut response = self.request(request).await?;
        let mut items = Vec::new();
        let mut pages = 1usize;

        loop {
            let next = response.next_link().map(str::to_string);
            items.extend(response.into_items());

            let Some(next) = next else {
                break;
            };

            pages += 1;
            tracing::debug!(page = pages, url = %next, "Following next page link");
            response = self
                .send(self.authorized(self.client.get(&next)))
                .await?;
        }

        tracing::debug!(pages, items = items.len(), "Pagination complete");
        Ok(items)
    }

    /// Fetch a file by absolute URL.
    ///
    /// Export URLs are pre-signed storage links, so no credentials are sent.
    pub async fn download(&self, url: &str) -> Result<BinaryData> {
        tracing::debug!(url = %url, "Downloading export file");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api(
                status.as_u16(),
                None,
                Some(format!("download of {} failed", url)),
            ));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        Ok(BinaryData {
            data: bytes.to_vec(),
            file_name: None,
            mime_type,
        })
    }

    /// Validate the credentials with the descriptor's test request.
    pub async fn test_credentials(&self) -> Result<()> {
        self.request(ApiRequest::get(TEST_REQUEST_PATH)).await?;
        Ok(())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<ApiResponse> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        if !status.is_success() {
            let detail: Option<ErrorBody> = serde_json::from_slice(&body).ok();
            let (code, message) = detail
                .map(|d| (d.code, d.message))
                .unwrap_or((None, None));
            tracing::debug!(status = status.as_u16(), ?code, "CloudConvert request failed");
            return Err(Error::api(status.as_u16(), code, message));
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ApiResponse::Bare(Value::Null));
        }

        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| Error::invalid_response(format!("expected JSON body: {}", e)))?;

        Ok(ApiResponse::from_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::get("/v2/jobs").query("filter[tag]", "invoices");
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query, vec![("filter[tag]".to_string(), "invoices".to_string())]);
        assert!(!req.sync);

        let req = ApiRequest::post("/v2/jobs", json!({ "tasks": {} })).sync(true);
        assert_eq!(req.method, Method::POST);
        assert!(req.sync);
        assert_eq!(req.body, Some(json!({ "tasks": {} })));
    }

    #[test]
    fn test_base_urls_follow_credentials() {
        let client = CloudConvertClient::new(Credentials::new("k", true));
        assert_eq!(client.base_url(false), "https://api.sandbox.cloudconvert.com");
        assert_eq!(client.base_url(true), "https://sync.api.sandbox.cloudconvert.com");
    }

    #[test]
    fn test_base_url_override_trims_slash() {
        let client = CloudConvertClient::new(Credentials::new("k", false))
            .with_base_urls("http://127.0.0.1:9000/", "http://127.0.0.1:9001");
        assert_eq!(client.url("/v2/jobs", false), "http://127.0.0.1:9000/v2/jobs");
        assert_eq!(client.url("/v2/jobs", true), "http://127.0.0.1:9001/v2/jobs");
    }
}
