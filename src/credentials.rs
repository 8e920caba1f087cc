//! CloudConvert API credentials and their descriptor.
//!
//! A credential is an API key plus a sandbox flag. The flag selects the base
//! domain for every request; the `sync` flag of a request selects between the
//! regular and the synchronous API host on top of that.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Production base domain.
pub const BASE_DOMAIN: &str = "cloudconvert.com";

/// Sandbox base domain.
pub const SANDBOX_DOMAIN: &str = "sandbox.cloudconvert.com";

/// Path used to validate a key.
pub const TEST_REQUEST_PATH: &str = "/v2/jobs";

/// API key and environment used for every request.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token.
    pub key: String,
    /// Whether the key belongs to the sandbox environment.
    #[serde(default)]
    pub sandbox: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"<redacted>")
            .field("sandbox", &self.sandbox)
            .finish()
    }
}

impl Credentials {
    pub fn new<S: Into<String>>(key: S, sandbox: bool) -> Self {
        Self {
            key: key.into(),
            sandbox,
        }
    }

    /// Domain all API hosts live under.
    pub fn base_domain(&self) -> &'static str {
        if self.sandbox {
            SANDBOX_DOMAIN
        } else {
            BASE_DOMAIN
        }
    }

    /// Base URL for a request; `sync` selects the synchronous API host.
    pub fn base_url(&self, sync: bool) -> String {
        if sync {
            format!("https://sync.api.{}", self.base_domain())
        } else {
            format!("https://api.{}", self.base_domain())
        }
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.key)
    }
}

/// Kind of a credential input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text, masked when `secret` is set.
    String,
    Boolean,
}

/// One input field of the credential form.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialField {
    pub name: &'static str,
    pub display_name: &'static str,
    pub kind: FieldKind,
    pub secret: bool,
    pub default: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

/// Request the host issues to check a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRequest {
    pub method: &'static str,
    pub path: &'static str,
}

/// Declarative description of the credential type.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub fields: Vec<CredentialField>,
    /// Headers applied to every authenticated request, as templates.
    pub headers: Vec<(&'static str, &'static str)>,
    pub test: TestRequest,
}

impl CredentialDescriptor {
    /// Build the test request URL for the given credentials.
    pub fn test_url(&self, credentials: &Credentials) -> String {
        format!("{}{}", credentials.base_url(false), self.test.path)
    }
}

/// Descriptor of the CloudConvert API credential.
pub fn descriptor() -> CredentialDescriptor {
    CredentialDescriptor {
        name: "cloudConvertCredentialsApi",
        display_name: "CloudConvert Credentials API",
        fields: vec![
            CredentialField {
                name: "key",
                display_name: "API Key",
                kind: FieldKind::String,
                secret: true,
                default: serde_json::Value::String(String::new()),
                description: Some(
                    "API key with at least the task.read and task.write scopes",
                ),
            },
            CredentialField {
                name: "sandbox",
                display_name: "Sandbox",
                kind: FieldKind::Boolean,
                secret: false,
                default: serde_json::Value::Bool(false),
                description: Some("Whether this API key is for the sandbox environment"),
            },
        ],
        headers: vec![
            ("Authorization", "Bearer {key}"),
            ("Content-Type", "application/json"),
        ],
        test: TestRequest {
            method: "GET",
            path: TEST_REQUEST_PATH,
        },
    }
}
