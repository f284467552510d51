use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use komiku_pdf::{ChapterDownloader, DownloadCommand};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = DownloadCommand::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let downloader = ChapterDownloader::new(args.to_config())?;

    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    progress_bar.enable_steady_tick(Duration::from_millis(100));
    progress_bar.set_message(format!(
        "Downloading: {}",
        args.url.as_deref().unwrap_or_default()
    ));

    let result = downloader.download(args.url.as_deref()).await;
    progress_bar.finish_and_clear();

    match result {
        Ok(pdf) => {
            std::fs::write(&args.output, &pdf.bytes)
                .with_context(|| format!("Failed to write PDF: {:?}", args.output))?;

            for skipped in &pdf.skipped {
                println!("⚠️  Skipped {}: {}", skipped.url.yellow(), skipped.reason);
            }
            println!(
                "✅ Saved {} page(s) to {}",
                pdf.page_count(),
                args.output.display().to_string().blue()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if args.json {
                eprintln!("{}", serde_json::to_string_pretty(&e.report())?);
            } else {
                eprintln!("❌ {} [{}]", e.to_string().red(), e.kind());
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
