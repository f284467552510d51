use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

/// Storage prefix of the Komiku image CDN. Logos, flags and thumbnails live elsewhere.
pub const DEFAULT_CONTENT_HOST: &str = "img.komiku.org/uploads";

/// Everything one chapter download needs. Built per request and passed in explicitly,
/// so two downloads never share headers or session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub client: ClientConfig,
    pub extract: ExtractConfig,
    pub assemble: AssembleConfig,
    /// Retry the chapter page with `view=all` when the first response yields no images.
    pub view_all_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            extract: ExtractConfig::default(),
            assemble: AssembleConfig::default(),
            view_all_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub user_agent: String,
    pub page_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub fallback_timeout_secs: u64,
}

impl ClientConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_timeout_secs: 15,
            image_timeout_secs: 20,
            fallback_timeout_secs: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Tag of the element that wraps the chapter pages.
    pub container_tag: String,
    /// Class of the element that wraps the chapter pages.
    pub container_class: String,
    /// Checked in order; the first non-empty value wins.
    pub source_attributes: Vec<String>,
    /// Regular expression matched against the lowercase URL without query or fragment.
    pub content_host_pattern: String,
    pub extensions: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            container_tag: "div".to_string(),
            container_class: "baca".to_string(),
            source_attributes: ["src", "data-src", "data-lazy", "data-original"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            content_host_pattern: regex::escape(DEFAULT_CONTENT_HOST),
            extensions: [".jpg", ".jpeg", ".png", ".webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssembleConfig {
    pub jpeg_quality: u8,
    pub max_concurrent_fetches: usize,
    /// Parent directory for per-request staging; the system temp dir when unset.
    pub staging_dir: Option<PathBuf>,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 95,
            max_concurrent_fetches: 4,
            staging_dir: None,
        }
    }
}
