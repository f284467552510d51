use futures::stream::{self, StreamExt};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AssembleConfig;
use crate::error::{AssembleError, FetchError};
use crate::fetcher::Fetcher;
use crate::normalize::{self, EncodedPage, PrepareError};
use crate::pdf_writer::PdfBuilder;
use crate::staging::StagingArea;

#[derive(Debug, Clone)]
pub enum SkipReason {
    Fetch(FetchError),
    Decode(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Fetch(e) => write!(f, "{}", e),
            SkipReason::Decode(e) => write!(f, "not a decodable image: {}", e),
        }
    }
}

/// An image that did not make it into the document.
#[derive(Debug, Clone)]
pub struct SkippedImage {
    pub url: String,
    pub reason: SkipReason,
}

#[derive(Debug)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    /// Source URL of every page, in page order.
    pub pages: Vec<String>,
    pub skipped: Vec<SkippedImage>,
}

impl AssembledDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

enum Fetched {
    Page(EncodedPage),
    Skipped(SkipReason),
}

/// Fetch one image and turn it into a JPEG page on the blocking pool. Fetch and
/// decode failures skip the image; an encode failure aborts the document.
async fn fetch_and_prepare<F: Fetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    timeout: Duration,
    quality: u8,
) -> Result<Fetched, AssembleError> {
    let bytes = match fetcher.fetch_image(url, timeout).await {
        Ok(bytes) => bytes,
        Err(e) => return Ok(Fetched::Skipped(SkipReason::Fetch(e))),
    };

    match tokio::task::spawn_blocking(move || normalize::prepare(&bytes, quality)).await? {
        Ok(page) => Ok(Fetched::Page(page)),
        Err(PrepareError::Decode(e)) => Ok(Fetched::Skipped(SkipReason::Decode(e.to_string()))),
        Err(PrepareError::Encode(e)) => Err(AssembleError::Encode(e)),
    }
}

/// Turns an ordered list of image URLs into one PDF, one page per image that
/// could be fetched and decoded.
#[derive(Debug, Clone)]
pub struct Assembler {
    config: AssembleConfig,
    image_timeout: Duration,
}

impl Assembler {
    pub fn new(config: AssembleConfig, image_timeout: Duration) -> Self {
        Self {
            config,
            image_timeout,
        }
    }

    /// Fetches run up to `max_concurrent_fetches` at a time but are consumed in
    /// input order, so page order always follows `urls`.
    pub async fn assemble<F: Fetcher + ?Sized>(
        &self,
        fetcher: &F,
        urls: &[String],
    ) -> Result<AssembledDocument, AssembleError> {
        let mut staging = StagingArea::new(self.config.staging_dir.as_deref())?;
        let mut skipped = Vec::new();

        let timeout = self.image_timeout;
        let quality = self.config.jpeg_quality;
        let fetches = stream::iter(urls)
            .map(|url| async move {
                let outcome = fetch_and_prepare(fetcher, url, timeout, quality).await;
                (url, outcome)
            })
            .buffered(self.config.max_concurrent_fetches.max(1));
        let mut fetches = std::pin::pin!(fetches);

        while let Some((url, outcome)) = fetches.next().await {
            let page = match outcome? {
                Fetched::Page(page) => page,
                Fetched::Skipped(reason) => {
                    match &reason {
                        SkipReason::Fetch(e) => warn!("Failed to download image {}: {}", url, e),
                        SkipReason::Decode(e) => warn!("Skipping undecodable image {}: {}", url, e),
                    }
                    skipped.push(SkippedImage {
                        url: url.clone(),
                        reason,
                    });
                    continue;
                }
            };

            staging.stage(url, &page.jpeg, page.width, page.height, page.color)?;
            debug!(
                "Staged page {} ({}x{}) from {}",
                staging.len(),
                page.width,
                page.height,
                url
            );
        }

        if staging.is_empty() {
            return Err(AssembleError::NoValidImages {
                attempted: urls.len(),
            });
        }

        let mut builder = PdfBuilder::new();
        for page in staging.pages() {
            let jpeg = staging.read(page)?;
            builder.add_jpeg_page(jpeg, page.width, page.height, page.color);
        }
        let bytes = builder.finish()?;

        let pages: Vec<String> = staging
            .pages()
            .iter()
            .map(|p| p.source_url.clone())
            .collect();

        if let Err(e) = staging.close() {
            warn!("Failed to remove staging directory: {}", e);
        }

        info!(
            "Assembled {} page(s) from {} image URL(s), {} skipped",
            pages.len(),
            urls.len(),
            skipped.len()
        );

        Ok(AssembledDocument {
            bytes,
            pages,
            skipped,
        })
    }
}
