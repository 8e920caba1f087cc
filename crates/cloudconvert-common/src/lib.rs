//! Cloudconvert-Common: Shared types and error handling.
//!
//! This crate provides the pieces shared between the CloudConvert action node,
//! its webhook trigger and the command-line front end:
//!
//! - **Items**: the JSON + binary item shape exchanged with the workflow host
//! - **Binary attachments**: downloaded or uploaded file payloads
//! - **Error Handling**: Common error type and result alias
//!
//! # Examples
//!
//! ```
//! use cloudconvert_common::{BinaryData, NodeItem, Error, Result};
//!
//! let mut item = NodeItem::from_json(serde_json::json!({ "id": "job-1" }));
//! item.binary.insert(
//!     "export-1_0".to_string(),
//!     BinaryData::new(b"%PDF".to_vec()).with_file_name("out.pdf"),
//! );
//! assert!(item.has_binary());
//!
//! fn example() -> Result<()> {
//!     Err(Error::missing_parameter("jobId"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
