use tracing::{debug, info, warn};
use url::Url;

use crate::assembler::{AssembledDocument, Assembler, SkippedImage};
use crate::config::PipelineConfig;
use crate::error::{ChapterError, ExtractError, FetchError, Result};
use crate::extractor::ImageExtractor;
use crate::fetcher::{Fetcher, HttpFetcher};

pub const PDF_FILE_NAME: &str = "komiku_chapter.pdf";

/// The finished chapter, ready to hand to the caller.
#[derive(Debug)]
pub struct ChapterPdf {
    pub bytes: Vec<u8>,
    pub content_type: mime::Mime,
    pub file_name: String,
    /// Source URL of every page, in page order.
    pub pages: Vec<String>,
    pub skipped: Vec<SkippedImage>,
}

impl ChapterPdf {
    fn from_document(document: AssembledDocument) -> Self {
        Self {
            bytes: document.bytes,
            content_type: mime::APPLICATION_PDF,
            file_name: PDF_FILE_NAME.to_string(),
            pages: document.pages,
            skipped: document.skipped,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Chapter page URL in, chapter PDF out.
pub struct ChapterDownloader<F: Fetcher = HttpFetcher> {
    fetcher: F,
    config: PipelineConfig,
    extractor: ImageExtractor,
    assembler: Assembler,
}

impl ChapterDownloader<HttpFetcher> {
    /// Downloader talking to the network with its own client built from `config`.
    pub fn new(config: PipelineConfig) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(&config.client)?;
        Ok(Self::with_fetcher(fetcher, config)?)
    }
}

impl<F: Fetcher> ChapterDownloader<F> {
    pub fn with_fetcher(
        fetcher: F,
        config: PipelineConfig,
    ) -> std::result::Result<Self, ExtractError> {
        let extractor = ImageExtractor::new(&config.extract)?;
        let assembler = Assembler::new(config.assemble.clone(), config.client.image_timeout());

        Ok(Self {
            fetcher,
            config,
            extractor,
            assembler,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn download(&self, chapter_url: Option<&str>) -> Result<ChapterPdf> {
        let chapter_url = chapter_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ChapterError::MissingInput)?;

        info!("Downloading chapter: {}", chapter_url);
        let image_urls = self.find_images(chapter_url).await?;
        info!("Found {} chapter image(s)", image_urls.len());

        let document = self.assembler.assemble(&self.fetcher, &image_urls).await?;
        Ok(ChapterPdf::from_document(document))
    }

    /// Fetch the chapter page and extract its image URLs, retrying once with
    /// `view=all` when enabled and the first response yields nothing.
    pub async fn find_images(&self, chapter_url: &str) -> Result<Vec<String>> {
        if let Err(e) = Url::parse(chapter_url) {
            return Err(ChapterError::FetchFailed {
                url: chapter_url.to_string(),
                source: FetchError::Transport {
                    url: chapter_url.to_string(),
                    reason: format!("invalid URL: {}", e),
                },
            });
        }

        let response = self
            .fetcher
            .fetch_page(chapter_url, self.config.client.page_timeout())
            .await
            .map_err(|source| ChapterError::FetchFailed {
                url: chapter_url.to_string(),
                source,
            })?;

        if !response.is_success() {
            return Err(ChapterError::FetchFailed {
                url: chapter_url.to_string(),
                source: FetchError::Status {
                    url: chapter_url.to_string(),
                    status: response.status,
                },
            });
        }

        let mut images = self.extract(&response.body, chapter_url)?;

        if images.is_empty() && self.config.view_all_fallback {
            images = self.view_all_fallback(chapter_url).await?;
        }

        if images.is_empty() {
            return Err(ChapterError::NoImagesFound {
                url: chapter_url.to_string(),
            });
        }

        Ok(images)
    }

    async fn view_all_fallback(&self, chapter_url: &str) -> Result<Vec<String>> {
        let Some(fallback_url) = view_all_url(chapter_url) else {
            return Ok(Vec::new());
        };

        debug!("No images on first pass, retrying with {}", fallback_url);
        match self
            .fetcher
            .fetch_page(&fallback_url, self.config.client.fallback_timeout())
            .await
        {
            Ok(response) if response.status == 200 => self.extract(&response.body, chapter_url),
            Ok(response) => {
                debug!("Fallback {} answered HTTP {}", fallback_url, response.status);
                Ok(Vec::new())
            }
            Err(e) => {
                warn!("Fallback request failed: {}", e);
                Ok(Vec::new())
            }
        }
    }

    fn extract(&self, html: &str, base_url: &str) -> Result<Vec<String>> {
        self.extractor
            .extract(html, Some(base_url))
            .map_err(|e| ChapterError::FetchFailed {
                url: base_url.to_string(),
                source: FetchError::Transport {
                    url: base_url.to_string(),
                    reason: e.to_string(),
                },
            })
    }
}

/// `chapter_url` without its trailing slash and with a `view=all` query pair
/// appended. None for unparseable URLs.
pub fn view_all_url(chapter_url: &str) -> Option<String> {
    let mut url = Url::parse(chapter_url).ok()?;
    let path = url.path().trim_end_matches('/').to_string();
    if !path.is_empty() {
        url.set_path(&path);
    }
    url.query_pairs_mut().append_pair("view", "all");
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_all_url() {
        assert_eq!(
            view_all_url("https://komiku.id/ch1/").as_deref(),
            Some("https://komiku.id/ch1?view=all")
        );
        assert_eq!(
            view_all_url("https://komiku.id/ch1").as_deref(),
            Some("https://komiku.id/ch1?view=all")
        );
        assert_eq!(
            view_all_url("https://komiku.id/").as_deref(),
            Some("https://komiku.id/?view=all")
        );
        assert_eq!(
            view_all_url("https://komiku.id/ch1?page=2").as_deref(),
            Some("https://komiku.id/ch1?page=2&view=all")
        );
        assert_eq!(view_all_url("not a url"), None);
    }
}
