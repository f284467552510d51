pub mod assembler;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod normalize;
pub mod pdf_writer;
pub mod staging;

// Re-export main types for convenience
pub use assembler::{AssembledDocument, Assembler, SkipReason, SkippedImage};
pub use cli::DownloadCommand;
pub use config::PipelineConfig;
pub use downloader::{ChapterDownloader, ChapterPdf};
pub use error::{ChapterError, ErrorKind, ErrorReport, FetchError};
pub use extractor::{ContentFilter, ImageExtractor};
pub use fetcher::{Fetcher, HttpFetcher, MemoryFetcher};
