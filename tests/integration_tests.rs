use image::{DynamicImage, ImageOutputFormat, RgbImage};
use komiku_pdf::config::ExtractConfig;
use komiku_pdf::{
    ChapterDownloader, ChapterError, ErrorKind, FetchError, ImageExtractor, MemoryFetcher,
    PipelineConfig,
};
use std::io::Cursor;

const CHAPTER_URL: &str = "https://komiku.id/ch1";

fn extractor() -> ImageExtractor {
    ImageExtractor::new(&ExtractConfig::default()).unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[test]
fn test_end_to_end_extraction_scenario() {
    let html = r#"
        <html><body>
            <div class="baca">
                <img src="/a.jpg">
                <img src="https://img.komiku.org/uploads/b.webp">
                <img src="https://ads.example.com/c.png">
            </div>
        </body></html>
    "#;

    assert_eq!(
        extractor().extract(html, Some(CHAPTER_URL)).unwrap(),
        vec!["https://img.komiku.org/uploads/b.webp".to_string()]
    );
}

#[test]
fn test_extraction_dedups_preserving_first_seen_order() {
    let html = r#"
        <div class="baca">
            <img src="https://img.komiku.org/uploads/A.jpg">
            <img src="https://img.komiku.org/uploads/B.jpg">
            <img src="https://img.komiku.org/uploads/A.jpg">
            <img src="https://img.komiku.org/uploads/C.jpg">
        </div>
    "#;

    assert_eq!(
        extractor().extract(html, None).unwrap(),
        vec![
            "https://img.komiku.org/uploads/A.jpg".to_string(),
            "https://img.komiku.org/uploads/B.jpg".to_string(),
            "https://img.komiku.org/uploads/C.jpg".to_string(),
        ]
    );
}

#[test]
fn test_extraction_is_idempotent() {
    let html = r#"
        <div class="baca">
            <img data-src="//img.komiku.org/uploads/01.jpg">
            <img src="https://img.komiku.org/uploads/02.png?w=800">
            <img src="/logo.png">
        </div>
    "#;

    let extractor = extractor();
    let first = extractor.extract(html, Some(CHAPTER_URL)).unwrap();
    let second = extractor.extract(html, Some(CHAPTER_URL)).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn test_primary_source_wins_over_lazy_attributes() {
    let html = r#"
        <div class="baca">
            <img src="https://img.komiku.org/uploads/real.jpg"
                 data-src="https://img.komiku.org/uploads/lazy.jpg"
                 data-original="https://img.komiku.org/uploads/original.jpg">
            <img data-lazy="https://img.komiku.org/uploads/lazy2.jpg"
                 data-original="https://img.komiku.org/uploads/original2.jpg">
        </div>
    "#;

    assert_eq!(
        extractor().extract(html, None).unwrap(),
        vec![
            "https://img.komiku.org/uploads/real.jpg".to_string(),
            "https://img.komiku.org/uploads/lazy2.jpg".to_string(),
        ]
    );
}

#[test]
fn test_non_content_images_never_extracted() {
    let html = r#"
        <img src="https://komiku.id/asset/img/logo.png">
        <img src="https://img.komiku.org/asset/flag-id.png">
        <img src="https://img.komiku.org/uploads/thumb.gif">
        <img src="https://img.komiku.org/uploads/01.jpg">
    "#;

    let images = extractor().extract(html, Some(CHAPTER_URL)).unwrap();
    assert_eq!(images, vec!["https://img.komiku.org/uploads/01.jpg".to_string()]);
    assert!(images.iter().all(|u| !u.contains("logo")));
}

#[test]
fn test_malformed_html_still_yields_images() {
    let html = r#"<div class="baca"><p><img src="https://img.komiku.org/uploads/01.jpg"><div><img src='https://img.komiku.org/uploads/02.jpg'></span>"#;

    assert_eq!(extractor().extract(html, None).unwrap().len(), 2);
}

#[test]
fn test_configurable_content_host() {
    let config = ExtractConfig {
        content_host_pattern: r"cdn\.example\.com/chapters".to_string(),
        ..ExtractConfig::default()
    };
    let html = r#"
        <img src="https://cdn.example.com/chapters/1.jpg">
        <img src="https://img.komiku.org/uploads/1.jpg">
    "#;

    assert_eq!(
        ImageExtractor::new(&config).unwrap().extract(html, None).unwrap(),
        vec!["https://cdn.example.com/chapters/1.jpg".to_string()]
    );
}

#[tokio::test]
async fn test_download_produces_pdf() {
    let html = r#"<div class="baca">
        <img src="https://img.komiku.org/uploads/1.png">
        <img src="https://img.komiku.org/uploads/2.png">
    </div>"#;
    let fetcher = MemoryFetcher::new()
        .with_page(CHAPTER_URL, html)
        .with_image("https://img.komiku.org/uploads/1.png", png(10, 20))
        .with_image("https://img.komiku.org/uploads/2.png", png(30, 40));

    let downloader = ChapterDownloader::with_fetcher(fetcher, PipelineConfig::default()).unwrap();
    let pdf = downloader.download(Some(CHAPTER_URL)).await.unwrap();

    assert_eq!(pdf.page_count(), 2);
    assert_eq!(pdf.content_type, mime::APPLICATION_PDF);
    assert_eq!(pdf.file_name, "komiku_chapter.pdf");
    assert!(pdf.bytes.starts_with(b"%PDF"));
    assert!(pdf.skipped.is_empty());

    let doc = lopdf::Document::load_mem(&pdf.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[tokio::test]
async fn test_missing_input() {
    let downloader =
        ChapterDownloader::with_fetcher(MemoryFetcher::new(), PipelineConfig::default()).unwrap();

    for input in [None, Some(""), Some("   ")] {
        let err = downloader.download(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingInput);
    }
}

#[tokio::test]
async fn test_page_fetch_failures() {
    let fetcher = MemoryFetcher::new()
        .with_status("https://komiku.id/forbidden", 403)
        .with_error(
            "https://komiku.id/slow",
            FetchError::Timeout {
                url: "https://komiku.id/slow".to_string(),
            },
        );
    let downloader = ChapterDownloader::with_fetcher(fetcher, PipelineConfig::default()).unwrap();

    for url in ["https://komiku.id/forbidden", "https://komiku.id/slow", "komiku.id/no-scheme"] {
        let err = downloader.download(Some(url)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FetchFailed, "{}", url);
    }
}

#[tokio::test]
async fn test_no_images_found_after_fallback() {
    let fetcher = MemoryFetcher::new()
        .with_page(CHAPTER_URL, "<html><body><p>Loading...</p></body></html>")
        .with_page(
            "https://komiku.id/ch1?view=all",
            r#"<img src="https://komiku.id/logo.png">"#,
        );
    let downloader = ChapterDownloader::with_fetcher(fetcher, PipelineConfig::default()).unwrap();

    let err = downloader.download(Some(CHAPTER_URL)).await.unwrap_err();
    assert!(matches!(err, ChapterError::NoImagesFound { .. }));
    assert_eq!(err.report().kind, ErrorKind::NoImagesFound);
}

#[tokio::test]
async fn test_view_all_fallback_finds_images() {
    let fetcher = MemoryFetcher::new()
        .with_page(CHAPTER_URL, "<html><body></body></html>")
        .with_page(
            "https://komiku.id/ch1?view=all",
            r#"<div class="baca"><img src="//img.komiku.org/uploads/1.png"></div>"#,
        )
        .with_image("https://img.komiku.org/uploads/1.png", png(8, 8));

    let downloader =
        ChapterDownloader::with_fetcher(fetcher.clone(), PipelineConfig::default()).unwrap();
    let pdf = downloader.download(Some(CHAPTER_URL)).await.unwrap();
    assert_eq!(pdf.pages, vec!["https://img.komiku.org/uploads/1.png".to_string()]);

    let config = PipelineConfig {
        view_all_fallback: false,
        ..PipelineConfig::default()
    };
    let downloader = ChapterDownloader::with_fetcher(fetcher, config).unwrap();
    let err = downloader.download(Some(CHAPTER_URL)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoImagesFound);
}

#[tokio::test]
async fn test_fallback_drops_trailing_slash() {
    let fetcher = MemoryFetcher::new()
        .with_page("https://komiku.id/ch1/", "<html><body></body></html>")
        .with_page(
            "https://komiku.id/ch1?view=all",
            r#"<div class="baca"><img src="//img.komiku.org/uploads/1.png"></div>"#,
        )
        .with_image("https://img.komiku.org/uploads/1.png", png(8, 8));
    let downloader = ChapterDownloader::with_fetcher(fetcher, PipelineConfig::default()).unwrap();

    let pdf = downloader.download(Some("https://komiku.id/ch1/")).await.unwrap();
    assert_eq!(pdf.page_count(), 1);
}

#[tokio::test]
async fn test_fallback_non_200_is_ignored() {
    let fetcher = MemoryFetcher::new()
        .with_page(CHAPTER_URL, "<html></html>")
        .with_status("https://komiku.id/ch1?view=all", 500);
    let downloader = ChapterDownloader::with_fetcher(fetcher, PipelineConfig::default()).unwrap();

    let err = downloader.download(Some(CHAPTER_URL)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoImagesFound);
}

#[tokio::test]
async fn test_no_valid_images() {
    let html = r#"<div class="baca">
        <img src="https://img.komiku.org/uploads/1.jpg">
        <img src="https://img.komiku.org/uploads/2.jpg">
    </div>"#;
    let fetcher = MemoryFetcher::new()
        .with_page(CHAPTER_URL, html)
        .with_status("https://img.komiku.org/uploads/1.jpg", 404)
        .with_image("https://img.komiku.org/uploads/2.jpg", b"not an image".to_vec());
    let downloader = ChapterDownloader::with_fetcher(fetcher, PipelineConfig::default()).unwrap();

    let err = downloader.download(Some(CHAPTER_URL)).await.unwrap_err();
    assert!(matches!(err, ChapterError::NoValidImages { attempted: 2 }));
    assert_eq!(err.kind().http_status(), 502);
}
