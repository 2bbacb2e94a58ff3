//! pager/io — чтение/запись страниц целиком.
//!
//! - read_page: exact-size read at `id * page_size`; a short read is an error.
//! - write_page: exact-size write; a short write is an error.
//! - append_page: write a page at the end of the file and return its id.
//!
//! There is no partial-page tolerance anywhere: a failed read or write leaves
//! the relation in an unknown state and the caller must stop using it.

use anyhow::{anyhow, Context, Result};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::metrics::{record_page_read, record_page_write};
use crate::page::Page;

use super::core::PageFile;

impl PageFile {
    /// Read page `page_id` into a freshly owned buffer.
    pub fn read_page(&self, page_id: u32) -> Result<Page> {
        if page_id >= self.npages {
            return Err(anyhow!(
                "{:?} page {} of {} not allocated ({} pages)",
                self.kind,
                page_id,
                self.path.display(),
                self.npages
            ));
        }
        let mut buf = vec![0u8; self.page_size];
        let mut f = &self.file;
        f.seek(SeekFrom::Start(self.offset_of(page_id)))?;
        f.read_exact(&mut buf)
            .with_context(|| format!("read page {} of {}", page_id, self.path.display()))?;
        record_page_read();
        Page::from_bytes(buf)
            .with_context(|| format!("decode page {} of {}", page_id, self.path.display()))
    }

    /// Write `page` over an existing page id.
    pub fn write_page(&mut self, page_id: u32, page: &Page) -> Result<()> {
        if page_id >= self.npages {
            return Err(anyhow!(
                "write to unallocated page {} of {} ({} pages)",
                page_id,
                self.path.display(),
                self.npages
            ));
        }
        self.write_at(page_id, page)
    }

    /// Append `page` at end of file; returns the new page id.
    pub fn append_page(&mut self, page: &Page) -> Result<u32> {
        let pid = self.npages;
        if pid == u32::MAX {
            return Err(anyhow!("page file {} is full", self.path.display()));
        }
        self.write_at(pid, page)?;
        self.npages += 1;
        Ok(pid)
    }

    /// Flush file contents to disk.
    pub fn sync(&self) -> Result<()> {
        if self.writable {
            self.file
                .sync_all()
                .with_context(|| format!("fsync {}", self.path.display()))?;
        }
        Ok(())
    }

    fn write_at(&mut self, page_id: u32, page: &Page) -> Result<()> {
        if !self.writable {
            return Err(anyhow!("page file {} is read-only", self.path.display()));
        }
        let buf = page.as_bytes();
        if buf.len() != self.page_size {
            return Err(anyhow!(
                "buffer size {} != page_size {}",
                buf.len(),
                self.page_size
            ));
        }
        let off = self.offset_of(page_id);
        self.file.seek(SeekFrom::Start(off))?;
        self.file
            .write_all(buf)
            .with_context(|| format!("write page {} of {}", page_id, self.path.display()))?;
        if self.data_fsync {
            self.file
                .sync_data()
                .with_context(|| format!("fsync {}", self.path.display()))?;
        }
        record_page_write();
        Ok(())
    }
}
