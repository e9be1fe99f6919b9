//! HTTP side of the application: submitting the image and following the server's answer.
//!
//! The detection server accepts `POST submit` with a multipart body holding a single
//! `image` part and answers `200` with plain text. The first `::`-separated segment of
//! that text is the page to navigate to, usually `/result/<name>`. The annotated image
//! behind that page lives at `/static/PRED_FOLDER/<name>.png`.

use std::io::Read;
use std::time::Duration;

use tracing::{debug, info, instrument};
use url::Url;

use crate::error::UploadError;
use crate::file::SelectedFile;
use crate::scopefns::Also;

pub mod multipart;

pub use multipart::Form;

/// Relative path of the submission endpoint.
pub const SUBMIT_PATH: &str = "submit";
/// Multipart field name the server reads the image from.
pub const IMAGE_FIELD: &str = "image";
/// Delimiter between the redirect target and anything the server appends after it.
pub const REDIRECT_DELIMITER: &str = "::";

const PREDICTION_FOLDER: &str = "/static/PRED_FOLDER";
/// Downloads larger than this are refused rather than cut short.
pub const MAX_DOWNLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Network operations the upload panel depends on.
///
/// Implementations are blocking; callers move them off the UI loop with
/// [`tokio::task::spawn_blocking`].
pub trait UploadClient: Send + Sync + 'static {
    /// Submits the file and returns the absolute URL the user should be sent to.
    fn submit(&self, file: &SelectedFile) -> Result<Url, UploadError>;

    /// Downloads `url` into memory.
    fn fetch(&self, url: &str) -> Result<SelectedFile, UploadError>;
}

/// [`UploadClient`] talking to a real server through a [`ureq::Agent`].
pub struct HttpClient {
    agent: ureq::Agent,
    server: Url,
    download_limit: u64,
}

impl HttpClient {
    pub fn new(server: &str, timeout: Duration) -> Result<Self, UploadError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("plant-disease-uploader/", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self {
            agent,
            server: server_url(server)?,
            download_limit: MAX_DOWNLOAD_BYTES,
        })
    }

    pub fn with_download_limit(mut self, limit: u64) -> Self {
        self.download_limit = limit;
        self
    }

    pub fn server(&self) -> &Url {
        &self.server
    }

    pub fn submit_url(&self) -> Url {
        // SUBMIT_PATH is a plain relative segment, joining it cannot fail
        self.server.join(SUBMIT_PATH).unwrap_or_else(|_| self.server.clone())
    }
}

impl UploadClient for HttpClient {
    #[instrument(skip_all, fields(file = %file.name, size = file.size()))]
    fn submit(&self, file: &SelectedFile) -> Result<Url, UploadError> {
        let form = Form::new().file(IMAGE_FIELD, file);
        let content_type = form.content_type();
        let url = self.submit_url();

        info!(%url, "uploading image");
        let response = self
            .agent
            .post(url.as_str())
            .set("Content-Type", &content_type)
            .send_bytes(&form.finish())?;

        if response.status() != 200 {
            return Err(UploadError::Status {
                code: response.status(),
                text: response.status_text().to_string(),
            });
        }

        let body = response
            .into_string()
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let target = redirect_target(&body)?;
        resolve(&self.server, target).also(|url| debug!(?url, "resolved redirect target"))
    }

    #[instrument(skip(self))]
    fn fetch(&self, url: &str) -> Result<SelectedFile, UploadError> {
        let parsed = Url::parse(url).map_err(|e| UploadError::invalid_url(url, e))?;
        let response = self.agent.get(parsed.as_str()).call()?;

        // ureq reports "text/plain" when the header is missing, which would hide the extension guess
        let mime = response
            .header("Content-Type")
            .map(|_| response.content_type().to_string());

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.download_limit + 1)
            .read_to_end(&mut bytes)
            .map_err(|e| UploadError::io(url, e))?;
        if bytes.len() as u64 > self.download_limit {
            return Err(UploadError::TooLarge {
                url: url.to_string(),
                limit: self.download_limit,
            });
        }

        let file = SelectedFile::new(file_name_from_url(&parsed), bytes);
        Ok(match mime {
            Some(mime) if mime != "application/octet-stream" => file.with_mime(mime),
            _ => file,
        })
    }
}

/// Parses the server base URL, making sure relative joins stay below its path.
pub fn server_url(server: &str) -> Result<Url, UploadError> {
    let mut url = Url::parse(server).map_err(|e| UploadError::invalid_url(server, e))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Extracts the navigation target from a submission response.
///
/// Only the first `::` segment is used; anything after it is status detail.
pub fn redirect_target(body: &str) -> Result<&str, UploadError> {
    let target = body.split(REDIRECT_DELIMITER).next().unwrap_or_default().trim();
    if target.is_empty() {
        return Err(UploadError::EmptyRedirect);
    }
    Ok(target)
}

/// Resolves a redirect target (absolute, root-relative or relative) against the server.
pub fn resolve(server: &Url, target: &str) -> Result<Url, UploadError> {
    server.join(target).map_err(|e| UploadError::invalid_url(target, e))
}

/// Maps a `/result/<name>` page to the `<name>.png` image the server renders for it.
pub fn prediction_image_url(result_page: &Url) -> Option<Url> {
    let mut segments = result_page.path_segments()?.filter(|s| !s.is_empty());
    match (segments.next(), segments.next(), segments.next()) {
        (Some("result"), Some(name), None) => result_page.join(&format!("{PREDICTION_FOLDER}/{name}.png")).ok(),
        _ => None,
    }
}

fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .unwrap_or_else(|| "download".to_string())
}
