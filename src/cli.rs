use clap::Parser;
use std::path::PathBuf;

use crate::config::{
    AssembleConfig, ClientConfig, ExtractConfig, PipelineConfig, DEFAULT_USER_AGENT,
};
use crate::downloader::PDF_FILE_NAME;

#[derive(Parser, Debug)]
#[command(
    name = "komiku-pdf",
    about = "Download a comic chapter's images as a single PDF",
    version,
    long_about = "Fetches a chapter reader page, extracts the chapter images from its markup, downloads them and concatenates them into one PDF, one image per page. Images that fail to download or decode are skipped."
)]
pub struct DownloadCommand {
    /// Chapter page URL, e.g. https://komiku.id/your-chapter-url
    pub url: Option<String>,

    /// Where to write the PDF
    #[arg(short, long, default_value = PDF_FILE_NAME)]
    pub output: PathBuf,

    /// User agent string to use for requests
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Timeout for the chapter page request in seconds
    #[arg(long, default_value = "15")]
    pub timeout: u64,

    /// Timeout for each image request in seconds
    #[arg(long, default_value = "20")]
    pub image_timeout: u64,

    /// Timeout for the view=all retry in seconds
    #[arg(long, default_value = "8")]
    pub fallback_timeout: u64,

    /// Tag of the element holding the chapter images
    #[arg(long, default_value = "div")]
    pub container_tag: String,

    /// Class of the element holding the chapter images
    #[arg(long, default_value = "baca")]
    pub container: String,

    /// Regex a lowercase image URL (query removed) must match to count as a chapter page
    /// [default: img\.komiku\.org/uploads]
    #[arg(long)]
    pub content_host: Option<String>,

    /// Do not retry the page with ?view=all when no images are found
    #[arg(long)]
    pub no_fallback: bool,

    /// Maximum concurrent image downloads
    #[arg(short = 'c', long, default_value = "4", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_concurrent: u64,

    /// JPEG quality used when re-encoding pages (1-100)
    #[arg(short, long, default_value = "95", value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    /// Parent directory for temporary page files
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Print errors as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl DownloadCommand {
    pub fn to_config(&self) -> PipelineConfig {
        let extract_defaults = ExtractConfig::default();

        PipelineConfig {
            client: ClientConfig {
                user_agent: self.user_agent.clone(),
                page_timeout_secs: self.timeout,
                image_timeout_secs: self.image_timeout,
                fallback_timeout_secs: self.fallback_timeout,
            },
            extract: ExtractConfig {
                container_tag: self.container_tag.clone(),
                container_class: self.container.clone(),
                content_host_pattern: self
                    .content_host
                    .clone()
                    .unwrap_or(extract_defaults.content_host_pattern),
                ..extract_defaults
            },
            assemble: AssembleConfig {
                jpeg_quality: self.quality,
                max_concurrent_fetches: self.max_concurrent as usize,
                staging_dir: self.staging_dir.clone(),
            },
            view_all_fallback: !self.no_fallback,
        }
    }
}
