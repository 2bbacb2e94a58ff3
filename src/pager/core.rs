//! pager/core — один файл страниц: структура PageFile, open/create и общие помощники.

use anyhow::{anyhow, Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Which file of a relation a page id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKind {
    /// Main bucket pages (`.data`); page id == bucket id.
    Data,
    /// Overflow chains and the free list (`.ovflow`).
    Ovflow,
}

/// A file made of fixed-size pages; page `id` lives at `id * page_size`.
pub struct PageFile {
    pub(crate) path: PathBuf,
    pub(crate) file: File,
    pub(crate) page_size: usize,
    pub(crate) kind: PageKind,
    pub(crate) writable: bool,
    // Fsync data after each page write.
    pub(crate) data_fsync: bool,
    // Pages currently in the file (len / page_size).
    pub(crate) npages: u32,
}

impl PageFile {
    /// Create an empty page file. Error if it already exists.
    pub fn create(path: &Path, page_size: usize, kind: PageKind) -> Result<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("create page file {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            page_size,
            kind,
            writable: true,
            data_fsync: false,
            npages: 0,
        })
    }

    /// Open an existing page file; its length must be a whole number of pages.
    pub fn open(path: &Path, page_size: usize, kind: PageKind, writable: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .with_context(|| format!("open page file {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("stat page file {}", path.display()))?
            .len();
        if len % page_size as u64 != 0 {
            return Err(anyhow!(
                "page file {} has length {} which is not a multiple of page_size {}",
                path.display(),
                len,
                page_size
            ));
        }
        let npages = u32::try_from(len / page_size as u64)
            .map_err(|_| anyhow!("page file {} has too many pages", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            page_size,
            kind,
            writable,
            data_fsync: false,
            npages,
        })
    }

    pub fn set_data_fsync(&mut self, on: bool) {
        self.data_fsync = on;
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[inline]
    pub fn page_count(&self) -> u32 {
        self.npages
    }

    #[inline]
    pub(crate) fn offset_of(&self, page_id: u32) -> u64 {
        page_id as u64 * self.page_size as u64
    }
}
