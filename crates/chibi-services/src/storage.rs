//! Filesystem store for uploaded XML payloads
//!
//! Uploaded CDR batches are archived verbatim before processing so a failed
//! ingest can be replayed. Layout mirrors the attachment convention:
//! `<root>/<model>/<attachment>/<record id>/<filename>`. Only `.xml` files
//! are accepted.

use chibi_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Attachment store rooted at a configured directory
#[derive(Debug, Clone)]
pub struct XmlStore {
    root: PathBuf,
}

impl XmlStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolve the on-disk path for one attachment
    ///
    /// # Errors
    ///
    /// Rejects filenames without the `.xml` extension with
    /// `AppError::UnsupportedAttachment`, and path components containing
    /// separators or parent references with `AppError::InvalidInput`.
    pub fn path_for(
        &self,
        model: &str,
        attachment: &str,
        record_id: &str,
        filename: &str,
    ) -> AppResult<PathBuf> {
        for component in [model, attachment, record_id, filename] {
            if component.is_empty()
                || component.contains(['/', '\\'])
                || component.contains("..")
            {
                return Err(AppError::InvalidInput(format!(
                    "Invalid path component: {:?}",
                    component
                )));
            }
        }

        if !filename.to_ascii_lowercase().ends_with(".xml") {
            return Err(AppError::UnsupportedAttachment(filename.to_string()));
        }

        Ok(self
            .root
            .join(model)
            .join(attachment)
            .join(record_id)
            .join(filename))
    }

    /// Write one attachment, creating parent directories as needed
    #[instrument(skip(self, contents), fields(bytes = contents.len()))]
    pub async fn save(
        &self,
        model: &str,
        attachment: &str,
        record_id: &str,
        filename: &str,
        contents: &[u8],
    ) -> AppResult<PathBuf> {
        let path = self.path_for(model, attachment, record_id, filename)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, contents).await?;

        debug!("Stored attachment at {}", path.display());
        Ok(path)
    }

    /// Read a previously stored attachment
    pub async fn load(
        &self,
        model: &str,
        attachment: &str,
        record_id: &str,
        filename: &str,
    ) -> AppResult<Vec<u8>> {
        let path = self.path_for(model, attachment, record_id, filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Attachment {}", path.display())))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> (XmlStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("chibi-store-{}", Uuid::new_v4()));
        (XmlStore::new(&root), root)
    }

    #[test]
    fn test_path_layout() {
        let store = XmlStore::new("/srv/storage");
        let path = store
            .path_for("cdr_batches", "payload", "17", "batch.xml")
            .unwrap();
        assert_eq!(
            path,
            PathBuf::from("/srv/storage/cdr_batches/payload/17/batch.xml")
        );
    }

    #[test]
    fn test_non_xml_extension_rejected() {
        let store = XmlStore::new("/srv/storage");
        let err = store
            .path_for("cdr_batches", "payload", "17", "batch.pdf")
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedAttachment(_)));
    }

    #[test]
    fn test_traversal_components_rejected() {
        let store = XmlStore::new("/srv/storage");
        let err = store
            .path_for("cdr_batches", "payload", "../17", "batch.xml")
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = store
            .path_for("cdr_batches", "payload", "17", "a/b.xml")
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (store, root) = temp_store();

        let path = store
            .save("cdr_batches", "payload", "17", "batch.xml", b"<cdrs/>")
            .await
            .unwrap();
        assert!(path.starts_with(&root));

        let bytes = store
            .load("cdr_batches", "payload", "17", "batch.xml")
            .await
            .unwrap();
        assert_eq!(bytes, b"<cdrs/>");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_missing_attachment_is_not_found() {
        let (store, _root) = temp_store();
        let err = store
            .load("cdr_batches", "payload", "17", "missing.xml")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
