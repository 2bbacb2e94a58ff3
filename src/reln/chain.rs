//! reln/chain — цепочки страниц бакета.
//!
//! A bucket chain is main page `d<bucket>` followed by overflow pages
//! `ov<id>` linked through `overflow_link`. Repairs (append, unlink) always
//! rewrite the predecessor's link before the removed or added page is
//! handed to the free list or filled, so a chain is never left half-linked.

use anyhow::{anyhow, Result};
use log::debug;
use std::collections::HashSet;
use std::fmt;

use crate::consts::MAX_CHAIN_LEN;
use crate::error::PageFull;
use crate::page::Page;

use super::core::Relation;

/// Where a page of a chain lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLoc {
    Main(u32),
    Ovflow(u32),
}

impl fmt::Display for PageLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageLoc::Main(id) => write!(f, "d{}", id),
            PageLoc::Ovflow(id) => write!(f, "ov{}", id),
        }
    }
}

impl Relation {
    pub(crate) fn read_loc(&self, loc: PageLoc) -> Result<Page> {
        match loc {
            PageLoc::Main(id) => self.data.read_page(id),
            PageLoc::Ovflow(id) => self.ovflow.read_page(id),
        }
    }

    pub(crate) fn write_loc(&mut self, loc: PageLoc, page: &Page) -> Result<()> {
        match loc {
            PageLoc::Main(id) => self.data.write_page(id, page),
            PageLoc::Ovflow(id) => self.ovflow.write_page(id, page),
        }
    }

    /// Every page of bucket `bucket`, main page first.
    pub fn chain(&self, bucket: u32) -> Result<Vec<PageLoc>> {
        if bucket >= self.meta.npages {
            return Err(anyhow!("bucket {} out of range 0..{}", bucket, self.meta.npages));
        }
        let mut out = vec![PageLoc::Main(bucket)];
        let mut seen = HashSet::new();
        let mut next = self.data.read_page(bucket)?.overflow();
        while let Some(id) = next {
            if out.len() > MAX_CHAIN_LEN || !seen.insert(id) {
                return Err(anyhow!("corrupt chain of bucket {}: loop at ov{}", bucket, id));
            }
            out.push(PageLoc::Ovflow(id));
            next = self.ovflow.read_page(id)?.overflow();
        }
        Ok(out)
    }

    /// Append `tuple` to the first page of the chain with room; if none has
    /// room, take an overflow page and link it after the tail.
    pub(crate) fn append_to_chain(&mut self, bucket: u32, tuple: &str) -> Result<PageLoc> {
        let mut loc = PageLoc::Main(bucket);
        let mut page = self.data.read_page(bucket)?;
        let mut hops = 0usize;
        loop {
            match page.append_tuple(tuple) {
                Ok(()) => {
                    self.write_loc(loc, &page)?;
                    return Ok(loc);
                }
                Err(PageFull) => {}
            }
            match page.overflow() {
                Some(id) => {
                    hops += 1;
                    if hops > MAX_CHAIN_LEN {
                        return Err(anyhow!("corrupt chain of bucket {}: loop at ov{}", bucket, id));
                    }
                    loc = PageLoc::Ovflow(id);
                    page = self.ovflow.read_page(id)?;
                }
                None => break,
            }
        }

        // Tail is full: new page gets the tuple first, then the tail's link.
        let id = self.free.acquire(&mut self.ovflow)?;
        let mut fresh = Page::new(self.meta.page_size as usize);
        fresh
            .append_tuple(tuple)
            .map_err(|_| anyhow!("tuple of {} bytes does not fit an empty page", tuple.len()))?;
        self.ovflow.write_page(id, &fresh)?;
        page.set_overflow(Some(id));
        self.write_loc(loc, &page)?;
        self.sync_meta();
        debug!("bucket {}: chained ov{} after {}", bucket, id, loc);
        Ok(PageLoc::Ovflow(id))
    }

    /// Detach overflow page `victim` that follows `prev` and push it on the
    /// free list. `prev_page` is the caller's copy of `prev`; it is updated
    /// and written back.
    pub(crate) fn unlink_and_release(
        &mut self,
        prev: PageLoc,
        prev_page: &mut Page,
        victim: u32,
    ) -> Result<()> {
        if prev_page.overflow() != Some(victim) {
            return Err(anyhow!("corrupt chain: {} does not link to ov{}", prev, victim));
        }
        let victim_page = self.ovflow.read_page(victim)?;
        prev_page.set_overflow(victim_page.overflow());
        self.write_loc(prev, prev_page)?;
        self.free.push(&mut self.ovflow, victim)?;
        self.sync_meta();
        Ok(())
    }

    /// Unlink every empty overflow page of `bucket` onto the free list.
    /// The main page always stays. Returns how many pages were released.
    pub(crate) fn reclaim_empty_overflow(&mut self, bucket: u32) -> Result<u32> {
        let mut prev = PageLoc::Main(bucket);
        let mut prev_page = self.data.read_page(bucket)?;
        let mut released = 0u32;
        let mut hops = 0usize;
        while let Some(id) = prev_page.overflow() {
            hops += 1;
            if hops > MAX_CHAIN_LEN {
                return Err(anyhow!("corrupt chain of bucket {}: loop at ov{}", bucket, id));
            }
            let page = self.ovflow.read_page(id)?;
            if page.is_empty() {
                self.unlink_and_release(prev, &mut prev_page, id)?;
                released += 1;
            } else {
                prev = PageLoc::Ovflow(id);
                prev_page = page;
            }
        }
        Ok(released)
    }
}
