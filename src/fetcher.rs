use futures::future::BoxFuture;
use reqwest::{Client, ClientBuilder};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::FetchError;

/// A page response whose status is reported rather than turned into an error,
/// so callers can decide which statuses they accept.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Outbound side of a chapter download: chapter pages and chapter images.
pub trait Fetcher: Send + Sync {
    fn fetch_page<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<PageResponse, FetchError>>;

    /// Raw image bytes; a non-success status is an error.
    fn fetch_image<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

/// reqwest-backed fetcher. Every request carries the configured user agent.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(config.user_agent.as_str())
            .timeout(config.page_timeout())
            .build()?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_page<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<PageResponse, FetchError>> {
        Box::pin(async move {
            debug!("Sending request to: {}", url);
            let response = self
                .client
                .get(url)
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;

            Ok(PageResponse { status, body })
        })
    }

    fn fetch_image<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;

            if !response.status().is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: response.status().as_u16(),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;

            Ok(bytes.to_vec())
        })
    }
}

#[derive(Debug, Clone)]
enum Canned {
    Page(u16, String),
    Image(Vec<u8>),
    Fail(FetchError),
}

/// Serves canned responses from memory. Unknown URLs answer HTTP 404.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    responses: HashMap<String, Canned>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Page(200, html.to_string()));
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), Canned::Page(status, String::new()));
        self
    }

    pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), Canned::Image(bytes));
        self
    }

    pub fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(url.to_string(), Canned::Fail(error));
        self
    }

    fn lookup(&self, url: &str) -> Result<&Canned, FetchError> {
        match self.responses.get(url) {
            Some(Canned::Fail(e)) => Err(e.clone()),
            Some(canned) => Ok(canned),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch_page<'a>(
        &'a self,
        url: &'a str,
        _timeout: Duration,
    ) -> BoxFuture<'a, Result<PageResponse, FetchError>> {
        Box::pin(async move {
            match self.lookup(url) {
                Ok(Canned::Page(status, body)) => Ok(PageResponse {
                    status: *status,
                    body: body.clone(),
                }),
                Ok(Canned::Image(bytes)) => Ok(PageResponse {
                    status: 200,
                    body: String::from_utf8_lossy(bytes).into_owned(),
                }),
                Ok(Canned::Fail(e)) => Err(e.clone()),
                Err(FetchError::Status { status, .. }) => Ok(PageResponse {
                    status,
                    body: String::new(),
                }),
                Err(e) => Err(e),
            }
        })
    }

    fn fetch_image<'a>(
        &'a self,
        url: &'a str,
        _timeout: Duration,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            match self.lookup(url)? {
                Canned::Image(bytes) => Ok(bytes.clone()),
                Canned::Page(status, body) if (200..300).contains(status) => {
                    Ok(body.clone().into_bytes())
                }
                Canned::Page(status, _) => Err(FetchError::Status {
                    url: url.to_string(),
                    status: *status,
                }),
                Canned::Fail(e) => Err(e.clone()),
            }
        })
    }
}
