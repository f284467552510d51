use regex::Regex;
use select::document::Document;
use select::node::Node;
use select::predicate::{Class, Name, Predicate};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use crate::config::ExtractConfig;
use crate::error::ExtractError;

/// Allow-list for genuine chapter pages. Both the host pattern and an image
/// extension must match; everything else on the page (logos, flags, thumbnails)
/// is dropped.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    host_pattern: Regex,
    extensions: Vec<String>,
}

impl ContentFilter {
    pub fn new(host_pattern: &str, extensions: &[String]) -> Result<Self, ExtractError> {
        Ok(Self {
            host_pattern: Regex::new(host_pattern)?,
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        })
    }

    pub fn accepts(&self, url: &str) -> bool {
        let low = strip_query(url).to_lowercase();

        self.host_pattern.is_match(&low) && self.extensions.iter().any(|ext| low.ends_with(ext))
    }
}

fn strip_query(url: &str) -> &str {
    match url.find(['?', '#']) {
        Some(idx) => &url[..idx],
        None => url,
    }
}

#[derive(Debug, Clone)]
pub struct ImageExtractor {
    container_tag: String,
    container_class: String,
    source_attributes: Vec<String>,
    filter: ContentFilter,
}

impl ImageExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            container_tag: config.container_tag.clone(),
            container_class: config.container_class.clone(),
            source_attributes: config.source_attributes.clone(),
            filter: ContentFilter::new(&config.content_host_pattern, &config.extensions)?,
        })
    }

    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    /// Ordered, deduplicated absolute URLs of the chapter images in `html`.
    ///
    /// Relative and protocol-relative references are resolved against `base_url`
    /// when one is given; without it only references that are already absolute
    /// survive. An empty result is not an error.
    pub fn extract(&self, html: &str, base_url: Option<&str>) -> Result<Vec<String>, ExtractError> {
        let base = base_url
            .map(|url| {
                Url::parse(url).map_err(|source| ExtractError::InvalidBaseUrl {
                    url: url.to_string(),
                    source,
                })
            })
            .transpose()?;

        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for reference in self.extract_references(html) {
            let Some(url) = resolve_reference(base.as_ref(), &reference) else {
                debug!("Unresolvable image reference: {}", reference);
                continue;
            };

            if !self.filter.accepts(&url) {
                debug!("Skipping non-content image: {}", url);
                continue;
            }

            if seen.insert(url.clone()) {
                images.push(url);
            }
        }

        debug!("Extracted {} chapter image(s)", images.len());
        Ok(images)
    }

    /// Raw source values of every `<img>` in the chapter container, in document order.
    pub fn extract_references(&self, html: &str) -> Vec<String> {
        let document = Document::from(html);

        let container = document
            .find(Name(self.container_tag.as_str()).and(Class(self.container_class.as_str())))
            .next();
        let img_nodes: Vec<Node> = match container {
            Some(container) => container.find(Name("img")).collect(),
            None => {
                debug!(
                    "No {}.{} container found, scanning the whole document",
                    self.container_tag, self.container_class
                );
                document.find(Name("img")).collect()
            }
        };

        img_nodes
            .iter()
            .filter_map(|img| self.source_of(img))
            .collect()
    }

    fn source_of(&self, img: &Node) -> Option<String> {
        self.source_attributes
            .iter()
            .filter_map(|attr| img.attr(attr))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }
}

fn resolve_reference(base: Option<&Url>, reference: &str) -> Option<String> {
    let resolved = match base {
        Some(base) => base.join(reference),
        None => Url::parse(reference),
    };

    resolved.ok().map(|url| url.to_string())
}
