use std::io;

/// Everything that can go wrong between picking a file and landing on the result page.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{url} is larger than {limit} bytes")]
    TooLarge { url: String, limit: u64 },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("server answered {code} {text}")]
    Status { code: u16, text: String },

    #[error("server response did not contain a redirect target")]
    EmptyRedirect,

    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl UploadError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl { url: url.into(), source }
    }
}

impl From<ureq::Error> for UploadError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => Self::Status {
                code,
                text: response.status_text().to_string(),
            },
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}
