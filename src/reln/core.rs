//! reln/core — структура Relation, адресация бакетов, close/Drop.
//!
//! Drop: read-write handle that was not closed explicitly persists its
//! metadata best-effort, the same way close() does.

use anyhow::Result;
use log::{info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::chvec::ChoiceVector;
use crate::consts::{DATA_EXT, INFO_EXT, LOCK_EXT, OVFLOW_EXT, PAGE_HDR_SIZE};
use crate::error::RelnError;
use crate::free::FreeList;
use crate::lock::LockGuard;
use crate::meta::{write_meta_overwrite, RelnMeta};
use crate::pager::PageFile;
use crate::util::{low_bits, Bits};

/// Access mode of an open relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// Paths of the files that make up relation `NAME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelnPaths {
    pub info: PathBuf,
    pub data: PathBuf,
    pub ovflow: PathBuf,
    pub lock: PathBuf,
}

impl RelnPaths {
    pub fn new(name: &Path) -> Self {
        let with_ext = |ext: &str| {
            let mut s: OsString = name.as_os_str().to_os_string();
            s.push(".");
            s.push(ext);
            PathBuf::from(s)
        };
        Self {
            info: with_ext(INFO_EXT),
            data: with_ext(DATA_EXT),
            ovflow: with_ext(OVFLOW_EXT),
            lock: with_ext(LOCK_EXT),
        }
    }
}

/// An open relation. All mutation goes through its methods.
pub struct Relation {
    pub(crate) paths: RelnPaths,
    pub(crate) meta: RelnMeta,
    pub(crate) data: PageFile,
    pub(crate) ovflow: PageFile,
    pub(crate) free: FreeList,
    pub(crate) mode: OpenMode,
    pub(crate) closed: bool,
    // held for the lifetime of the handle
    pub(crate) _lock: LockGuard,
}

impl Relation {
    /// Does relation `name` exist (its metadata file is present)?
    pub fn exists(name: impl AsRef<Path>) -> bool {
        RelnPaths::new(name.as_ref()).info.exists()
    }

    // -------- accessors --------

    #[inline]
    pub fn paths(&self) -> &RelnPaths {
        &self.paths
    }

    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    #[inline]
    pub fn nattrs(&self) -> u32 {
        self.meta.nattrs
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.meta.depth
    }

    #[inline]
    pub fn split_pointer(&self) -> u32 {
        self.meta.sp
    }

    /// Number of main (bucket) pages.
    #[inline]
    pub fn npages(&self) -> u32 {
        self.meta.npages
    }

    #[inline]
    pub fn ntuples(&self) -> u32 {
        self.meta.ntuples
    }

    /// First page of the overflow free list, if any.
    #[inline]
    pub fn free_head(&self) -> Option<u32> {
        if self.free.is_empty() {
            None
        } else {
            Some(self.free.head())
        }
    }

    #[inline]
    pub fn choice_vector(&self) -> &ChoiceVector {
        &self.meta.chvec
    }

    #[inline]
    pub fn page_size(&self) -> u32 {
        self.meta.page_size
    }

    #[inline]
    pub fn split_every(&self) -> u32 {
        self.meta.split_every
    }

    /// Pages in the overflow file (in chains or on the free list).
    #[inline]
    pub fn overflow_pages(&self) -> u32 {
        self.ovflow.page_count()
    }

    /// Longest tuple (bytes) that fits in an empty page.
    #[inline]
    pub fn max_tuple_len(&self) -> usize {
        self.meta.page_size as usize - PAGE_HDR_SIZE - 1
    }

    /// Bucket for hash `h` under the current depth and split pointer.
    pub fn bucket_of(&self, h: Bits) -> u32 {
        let addr = low_bits(h, self.meta.depth);
        if addr < self.meta.sp {
            low_bits(h, self.meta.depth + 1)
        } else {
            addr
        }
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.mode != OpenMode::ReadWrite {
            return Err(RelnError::ReadOnly.into());
        }
        Ok(())
    }

    /// Keep the metadata snapshot in step with in-memory state.
    pub(crate) fn sync_meta(&mut self) {
        self.meta.free_head = self.free.head();
    }

    /// Write metadata and flush both page files.
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.sync_meta();
        self.data.sync()?;
        self.ovflow.sync()?;
        write_meta_overwrite(&self.paths.info, &self.meta)
    }

    /// Persist (read-write only) and release the handle.
    pub fn close(mut self) -> Result<()> {
        if self.mode == OpenMode::ReadWrite {
            self.flush()?;
        }
        self.closed = true;
        info!(
            "closed relation {} (d={}, sp={}, pages={}, tuples={})",
            self.paths.info.display(),
            self.meta.depth,
            self.meta.sp,
            self.meta.npages,
            self.meta.ntuples
        );
        Ok(())
    }
}

impl Drop for Relation {
    fn drop(&mut self) {
        if self.closed || self.mode != OpenMode::ReadWrite {
            return;
        }
        if let Err(e) = self.flush() {
            warn!("relation {}: flush on drop failed: {:#}", self.paths.info.display(), e);
        }
    }
}
