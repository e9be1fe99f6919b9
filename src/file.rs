//! The file the user picked and its inline preview.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, instrument};

use crate::error::UploadError;

/// An image held in memory for the duration of one upload attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let mime = mime_guess::from_path(&name).first_or_octet_stream().essence_str().to_string();
        Self {
            name,
            mime,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn read(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| UploadError::io(path.display().to_string(), e))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        debug!(%name, size = bytes.len(), "read file");
        Ok(Self::new(name, bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encodes the file as `data:<mime>;base64,<payload>`, the form an `<img src>` accepts.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.size())
            .finish()
    }
}

/// Formats a file size in bytes to a human-readable string.
pub fn format_file_size(size: usize) -> String {
    let size_f = size as f64;
    if size < 1024 {
        format!("{} B", size)
    } else if size < 1024 * 1024 {
        format!("{:.2} KB", size_f / 1024.0)
    } else {
        format!("{:.2} MB", size_f / 1024.0 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_carries_guessed_mime_and_base64_payload() {
        let file = SelectedFile::new("leaf.png", b"hello".to_vec());
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn unknown_extension_falls_back_to_octet_stream() {
        let file = SelectedFile::new("leaf", vec![1u8, 2, 3]);
        assert_eq!(file.data_url(), "data:application/octet-stream;base64,AQID");
    }

    #[test]
    fn file_sizes_are_human_readable() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[tokio::test]
    async fn read_takes_name_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tomato.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let file = SelectedFile::read(&path).await.unwrap();
        assert_eq!(file.name, "tomato.jpg");
        assert_eq!(file.mime, "image/jpeg");
        assert_eq!(file.bytes(), b"jpeg");
    }

    #[tokio::test]
    async fn read_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = SelectedFile::read(dir.path().join("missing.png")).await.unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }
}
