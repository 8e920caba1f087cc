//! Item and binary attachment types exchanged with the workflow host.
//!
//! Every node consumes and produces [`NodeItem`]s: a JSON document plus a map
//! of named binary attachments. Attachments keep their raw bytes; encoding to
//! base64 happens only when a payload is sent to CloudConvert.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named binary attachments of a single item, keyed by property name.
pub type BinaryMap = BTreeMap<String, BinaryData>;

/// A binary attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryData {
    /// Raw file content.
    #[serde(skip)]
    pub data: Vec<u8>,
    /// Original file name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Mime type reported by the source, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl BinaryData {
    /// Wrap raw bytes with no file name or mime type.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            file_name: None,
            mime_type: None,
        }
    }

    /// Set the file name.
    pub fn with_file_name<S: Into<String>>(mut self, file_name: S) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the mime type.
    pub fn with_mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A single item flowing between workflow nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeItem {
    /// JSON document of the item.
    pub json: Value,
    /// Binary attachments keyed by property name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binary: BinaryMap,
}

impl NodeItem {
    /// Create an item carrying only JSON.
    pub fn from_json(json: Value) -> Self {
        Self {
            json,
            binary: BinaryMap::new(),
        }
    }

    /// Add a named attachment.
    pub fn with_binary<S: Into<String>>(mut self, name: S, data: BinaryData) -> Self {
        self.binary.insert(name.into(), data);
        self
    }

    /// Whether the item carries any attachment.
    pub fn has_binary(&self) -> bool {
        !self.binary.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_binary_builder() {
        let data = BinaryData::new(b"hello".to_vec())
            .with_file_name("hello.txt")
            .with_mime_type("text/plain");
        assert_eq!(data.len(), 5);
        assert!(!data.is_empty());
        assert_eq!(data.file_name.as_deref(), Some("hello.txt"));
        assert_eq!(data.mime_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_item_serialization_omits_empty_binary() {
        let item = NodeItem::from_json(json!({ "success": true }));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({ "json": { "success": true } }));
    }

    #[test]
    fn test_item_serialization_lists_attachment_metadata() {
        let item = NodeItem::from_json(json!({})).with_binary(
            "export-1_0",
            BinaryData::new(vec![1, 2, 3]).with_file_name("out.png"),
        );
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["binary"]["export-1_0"]["file_name"], "out.png");
        assert!(value["binary"]["export-1_0"].get("data").is_none());
    }
}
