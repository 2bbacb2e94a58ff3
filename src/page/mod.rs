//! page — страница фиксированного размера с упакованными кортежами.
//!
//! A page is an owned buffer of exactly `page_size` bytes:
//! header (see `header.rs`) followed by a data area holding NUL-terminated
//! tuples packed from offset 0. Invariants:
//! - `free_offset` == sum of (len + 1) over the packed tuples;
//! - a tuple is either fully present or absent, never split across pages;
//! - header + data == page_size.
//!
//! Pages are read by value (`PageFile::read_page`) and written back explicitly;
//! nothing here touches files.

pub mod header;

use anyhow::{anyhow, Result};

use crate::consts::{NO_PAGE, PAGE_HDR_SIZE};
use crate::error::PageFull;

pub use header::{page_header_read, page_header_write, PageHeader};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    hdr: PageHeader,
    buf: Vec<u8>,
}

impl Page {
    /// Fresh empty page: zeroed data, no overflow link, no tuples.
    pub fn new(page_size: usize) -> Self {
        debug_assert!(page_size > PAGE_HDR_SIZE);
        let hdr = PageHeader::empty();
        let mut buf = vec![0u8; page_size];
        page_header_write(&mut buf, &hdr);
        Self { hdr, buf }
    }

    /// Wrap a raw buffer read from disk.
    pub fn from_bytes(buf: Vec<u8>) -> Result<Self> {
        let hdr = page_header_read(&buf)?;
        Ok(Self { hdr, buf })
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn data_capacity(&self) -> usize {
        self.buf.len() - PAGE_HDR_SIZE
    }

    #[inline]
    pub fn header(&self) -> PageHeader {
        self.hdr
    }

    #[inline]
    pub fn free_offset(&self) -> usize {
        self.hdr.free_offset as usize
    }

    #[inline]
    pub fn free_space(&self) -> usize {
        self.data_capacity() - self.free_offset()
    }

    #[inline]
    pub fn tuple_count(&self) -> u32 {
        self.hdr.tuple_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hdr.tuple_count == 0
    }

    /// Next page in the chain.
    #[inline]
    pub fn overflow(&self) -> Option<u32> {
        match self.hdr.overflow_link {
            NO_PAGE => None,
            pid => Some(pid),
        }
    }

    pub fn set_overflow(&mut self, next: Option<u32>) {
        self.hdr.overflow_link = next.unwrap_or(NO_PAGE);
        self.sync_header();
    }

    /// Would a tuple of `len` bytes (plus its terminator) fit?
    #[inline]
    pub fn fits(&self, len: usize) -> bool {
        self.free_offset() + len + 1 <= self.data_capacity()
    }

    /// Append a tuple. Pure capacity check: on `PageFull` nothing changes.
    pub fn append_tuple(&mut self, tuple: &str) -> std::result::Result<(), PageFull> {
        let n = tuple.len();
        if !self.fits(n) {
            return Err(PageFull);
        }
        let start = PAGE_HDR_SIZE + self.free_offset();
        self.buf[start..start + n].copy_from_slice(tuple.as_bytes());
        self.buf[start + n] = 0;
        self.hdr.free_offset += n as u32 + 1;
        self.hdr.tuple_count += 1;
        self.sync_header();
        Ok(())
    }

    /// Tuple starting at `offset` within the data area, with the offset of
    /// the next one. `None` once `offset` reaches the free space.
    pub fn tuple_at(&self, offset: usize) -> Result<Option<(&str, usize)>> {
        let end = self.free_offset();
        if offset >= end {
            return Ok(None);
        }
        let data = &self.buf[PAGE_HDR_SIZE..PAGE_HDR_SIZE + end];
        let nul = data[offset..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| anyhow!("corrupt page: unterminated tuple at offset {}", offset))?;
        let raw = &data[offset..offset + nul];
        let s = std::str::from_utf8(raw)
            .map_err(|e| anyhow!("corrupt page: tuple at offset {} is not UTF-8: {}", offset, e))?;
        Ok(Some((s, offset + nul + 1)))
    }

    /// All tuples in page order; checks the count against the header.
    pub fn tuples(&self) -> Result<Vec<&str>> {
        let mut out = Vec::with_capacity(self.hdr.tuple_count as usize);
        let mut off = 0usize;
        while let Some((t, next)) = self.tuple_at(off)? {
            out.push(t);
            off = next;
        }
        if out.len() != self.hdr.tuple_count as usize {
            return Err(anyhow!(
                "corrupt page: header says {} tuples, found {}",
                self.hdr.tuple_count,
                out.len()
            ));
        }
        Ok(out)
    }

    /// Back to the state of `Page::new`: no tuples, no overflow link.
    pub fn reset(&mut self) {
        self.clear_tuples();
        self.set_overflow(None);
    }

    /// Drop every tuple but keep the overflow link (chain stays intact).
    pub fn clear_tuples(&mut self) {
        for b in &mut self.buf[PAGE_HDR_SIZE..] {
            *b = 0;
        }
        self.hdr.free_offset = 0;
        self.hdr.tuple_count = 0;
        self.sync_header();
    }

    #[inline]
    fn sync_header(&mut self) {
        page_header_write(&mut self.buf, &self.hdr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_until_full_without_mutation_on_failure() {
        // 32 bytes of data area
        let mut p = Page::new(PAGE_HDR_SIZE + 32);
        assert_eq!(p.free_space(), 32);
        p.append_tuple("0123456789").unwrap(); // 11
        p.append_tuple("0123456789").unwrap(); // 22
        let before = p.clone();
        assert_eq!(p.append_tuple("0123456789"), Err(PageFull)); // would need 33
        assert_eq!(p, before);
        p.append_tuple("012345678").unwrap(); // exactly 32
        assert_eq!(p.free_space(), 0);
        assert_eq!(p.append_tuple(""), Err(PageFull));
        assert_eq!(p.tuple_count(), 3);
        assert_eq!(p.free_offset(), 32);
    }

    #[test]
    fn tuples_survive_bytes_roundtrip() {
        let mut p = Page::new(256);
        p.append_tuple("1,2,3").unwrap();
        p.append_tuple("").unwrap();
        p.append_tuple("x,y,z").unwrap();
        p.set_overflow(Some(9));

        let q = Page::from_bytes(p.as_bytes().to_vec()).unwrap();
        assert_eq!(q.tuples().unwrap(), vec!["1,2,3", "", "x,y,z"]);
        assert_eq!(q.overflow(), Some(9));
        assert_eq!(q.free_offset(), 6 + 1 + 6);

        let (first, next) = q.tuple_at(0).unwrap().unwrap();
        assert_eq!((first, next), ("1,2,3", 6));
        assert!(q.tuple_at(q.free_offset()).unwrap().is_none());
    }

    #[test]
    fn clear_keeps_link_reset_drops_it() {
        let mut p = Page::new(128);
        p.append_tuple("abc").unwrap();
        p.set_overflow(Some(3));

        p.clear_tuples();
        assert!(p.is_empty());
        assert_eq!(p.overflow(), Some(3));

        p.append_tuple("abc").unwrap();
        p.reset();
        assert_eq!(p, Page::new(128));
    }

    #[test]
    fn detects_count_mismatch() {
        let mut p = Page::new(128);
        p.append_tuple("abc").unwrap();
        let mut raw = p.as_bytes().to_vec();
        let mut h = page_header_read(&raw).unwrap();
        h.tuple_count = 2;
        page_header_write(&mut raw, &h);
        let q = Page::from_bytes(raw).unwrap();
        assert!(q.tuples().is_err());
    }
}
