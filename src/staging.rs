use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::normalize::PageColor;

/// One re-encoded page waiting for assembly.
#[derive(Debug, Clone)]
pub struct StagedPage {
    pub path: PathBuf,
    pub source_url: String,
    pub width: u32,
    pub height: u32,
    pub color: PageColor,
}

/// Per-request scratch directory for re-encoded pages.
///
/// The directory and everything in it is removed when the area is dropped, so
/// staged files never outlive the request, whether assembly succeeds, fails or
/// unwinds.
pub struct StagingArea {
    dir: TempDir,
    pages: Vec<StagedPage>,
}

impl StagingArea {
    pub fn new(parent: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("komiku-pdf-");

        let dir = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        Ok(Self {
            dir,
            pages: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn pages(&self) -> &[StagedPage] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Write one JPEG page. Pages keep the order in which they are staged.
    pub fn stage(
        &mut self,
        source_url: &str,
        jpeg: &[u8],
        width: u32,
        height: u32,
        color: PageColor,
    ) -> std::io::Result<&StagedPage> {
        let path = self
            .dir
            .path()
            .join(format!("page-{:04}.jpg", self.pages.len() + 1));

        let mut file = fs::File::create(&path)?;
        file.write_all(jpeg)?;
        file.flush()?;

        self.pages.push(StagedPage {
            path,
            source_url: source_url.to_string(),
            width,
            height,
            color,
        });

        Ok(&self.pages[self.pages.len() - 1])
    }

    pub fn read(&self, page: &StagedPage) -> std::io::Result<Vec<u8>> {
        fs::read(&page.path)
    }

    /// Remove the directory now instead of on drop, reporting any I/O error.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
