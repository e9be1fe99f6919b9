//! Minimal `multipart/form-data` encoder, enough for one file part per field.
//!
//! ureq 2 has no form support of its own, so the body is assembled here and sent with
//! [`ureq::Request::send_bytes`].

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::file::SelectedFile;

static BOUNDARY_COUNTER: AtomicU64 = AtomicU64::new(0);

pub struct Form {
    boundary: String,
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        let unique_id = BOUNDARY_COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self::with_boundary(format!("----PlantDiseaseBoundary{:x}{:x}{:x}", std::process::id(), nanos, unique_id))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn file(mut self, field: &str, file: &SelectedFile) -> Self {
        self.body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_quoted(field),
                escape_quoted(&file.name)
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.mime).as_bytes());
        self.body.extend_from_slice(file.bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Closes the form and returns the encoded body.
    pub fn finish(mut self) -> Vec<u8> {
        self.body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

// Browsers percent-encode these in header parameters rather than backslash-escaping them.
fn escape_quoted(value: &str) -> String {
    value.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}
