//! Writing binary attachments to disk.

use anyhow::{Context, Result};
use cloudconvert_common::NodeItem;
use std::path::{Path, PathBuf};

/// File name an attachment is written under.
pub fn attachment_file_name(attachment: &str, file_name: Option<&str>) -> String {
    let name = match file_name {
        Some(file_name) if !file_name.is_empty() => format!("{}-{}", attachment, file_name),
        _ => attachment.to_string(),
    };
    name.replace(['/', '\\'], "_")
}

/// Write every attachment of `item` into `dir`, returning the written paths.
pub fn write_attachments(dir: &Path, item: &NodeItem) -> Result<Vec<PathBuf>> {
    if !item.has_binary() {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    let mut written = Vec::with_capacity(item.binary.len());
    for (name, binary) in &item.binary {
        let path = dir.join(attachment_file_name(name, binary.file_name.as_deref()));
        std::fs::write(&path, &binary.data)
            .with_context(|| format!("Failed to write attachment: {:?}", path))?;
        tracing::info!("Saved {} ({} bytes) to {}", name, binary.len(), path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudconvert_common::BinaryData;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_attachment_file_name() {
        assert_eq!(attachment_file_name("export-1_0", Some("out.pdf")), "export-1_0-out.pdf");
        assert_eq!(attachment_file_name("export-1_0", None), "export-1_0");
        assert_eq!(attachment_file_name("a", Some("../etc/passwd")), "a-.._etc_passwd");
    }

    #[test]
    fn test_write_attachments() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("downloads");
        let item = NodeItem::from_json(json!({}))
            .with_binary("task-1_0", BinaryData::new(b"data".to_vec()).with_file_name("a.txt"));

        let written = write_attachments(&out, &item).unwrap();
        assert_eq!(written, vec![out.join("task-1_0-a.txt")]);
        assert_eq!(std::fs::read(&written[0]).unwrap(), b"data");

        let empty = write_attachments(&out, &NodeItem::default()).unwrap();
        assert!(empty.is_empty());
    }
}
