use serde::Serialize;
use thiserror::Error;

/// Request-level failures of a chapter download. Per-image problems never show up
/// here unless they leave nothing to assemble.
#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("missing url: no chapter page URL was supplied")]
    MissingInput,

    #[error("failed to fetch chapter page {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("no image URLs found on {url}; the site may block scrapers or use dynamic loading")]
    NoImagesFound { url: String },

    #[error("failed to download or decode any of the {attempted} chapter images")]
    NoValidImages { attempted: usize },

    #[error("failed to assemble PDF: {0}")]
    AssemblyFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInput,
    FetchFailed,
    NoImagesFound,
    NoValidImages,
    AssemblyFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingInput => "missing_input",
            ErrorKind::FetchFailed => "fetch_failed",
            ErrorKind::NoImagesFound => "no_images_found",
            ErrorKind::NoValidImages => "no_valid_images",
            ErrorKind::AssemblyFailed => "assembly_failed",
        }
    }

    /// Status a host HTTP layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::MissingInput | ErrorKind::FetchFailed => 400,
            ErrorKind::NoImagesFound => 422,
            ErrorKind::NoValidImages => 502,
            ErrorKind::AssemblyFailed => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable form of a [`ChapterError`] for callers that answer over the wire.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub kind: ErrorKind,
    pub detail: String,
}

impl ChapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChapterError::MissingInput => ErrorKind::MissingInput,
            ChapterError::FetchFailed { .. } => ErrorKind::FetchFailed,
            ChapterError::NoImagesFound { .. } => ErrorKind::NoImagesFound,
            ChapterError::NoValidImages { .. } => ErrorKind::NoValidImages,
            ChapterError::AssemblyFailed(_) => ErrorKind::AssemblyFailed,
        }
    }

    pub fn report(&self) -> ErrorReport {
        let (error, detail) = match self {
            ChapterError::MissingInput => ("missing url query parameter", self.to_string()),
            ChapterError::FetchFailed { source, .. } => {
                ("failed to fetch chapter page", source.to_string())
            }
            ChapterError::NoImagesFound { .. } => ("no image URLs found", self.to_string()),
            ChapterError::NoValidImages { .. } => {
                ("failed to download any images from the chapter", self.to_string())
            }
            ChapterError::AssemblyFailed(reason) => ("failed to assemble PDF", reason.clone()),
        };

        ErrorReport {
            error: error.to_string(),
            kind: self.kind(),
            detail,
        }
    }
}

/// A single outbound request that did not produce a usable body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

impl FetchError {
    pub fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = e.status() {
            FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid content host pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("none of the {attempted} images could be fetched and decoded")]
    NoValidImages { attempted: usize },

    #[error("staging error: {0}")]
    Staging(#[from] std::io::Error),

    #[error("image encode error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("image worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("PDF write error: {0}")]
    Document(String),
}

impl From<AssembleError> for ChapterError {
    fn from(e: AssembleError) -> Self {
        match e {
            AssembleError::NoValidImages { attempted } => ChapterError::NoValidImages { attempted },
            other => ChapterError::AssemblyFailed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChapterError>;
