//! free — free‑лист overflow‑страниц.
//!
//! Формат:
//! - The list lives inside the overflow file itself: every free page is an
//!   empty page whose `overflow_link` points at the next free page.
//! - The head page id is persisted in the relation metadata (`free_head`),
//!   NO_PAGE when the list is empty.
//!
//! Политика:
//! - push/pop work at the head (LIFO); pushed pages are reset to empty first.
//! - acquire() prefers a free page over growing the file.
//! - Single writer only: callers hold the relation's exclusive handle.

use anyhow::{anyhow, Result};
use log::debug;
use std::collections::HashSet;

use crate::consts::{MAX_CHAIN_LEN, NO_PAGE};
use crate::metrics::{record_overflow_grown, record_overflow_released, record_overflow_reused};
use crate::page::Page;
use crate::pager::PageFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeList {
    head: u32,
}

impl FreeList {
    pub fn new(head: u32) -> Self {
        Self { head }
    }

    /// Head page id (NO_PAGE when empty); persisted by the caller.
    #[inline]
    pub fn head(&self) -> u32 {
        self.head
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == NO_PAGE
    }

    /// Push an unlinked overflow page onto the list.
    /// The page is reset to empty and linked to the old head.
    pub fn push(&mut self, ovflow: &mut PageFile, page_id: u32) -> Result<()> {
        if page_id >= ovflow.page_count() {
            return Err(anyhow!("free list push: page {} not allocated", page_id));
        }
        if page_id == self.head {
            return Err(anyhow!("free list push: page {} is already the head", page_id));
        }
        let mut page = Page::new(ovflow.page_size());
        if self.head != NO_PAGE {
            page.set_overflow(Some(self.head));
        }
        ovflow.write_page(page_id, &page)?;
        debug!("free list: push ov{} (next {})", page_id, fmt_pid(self.head));
        self.head = page_id;
        record_overflow_released();
        Ok(())
    }

    /// Pop the head page. The returned page is written back as a fresh,
    /// unlinked empty page.
    pub fn pop(&mut self, ovflow: &mut PageFile) -> Result<Option<u32>> {
        if self.head == NO_PAGE {
            return Ok(None);
        }
        let pid = self.head;
        let page = ovflow.read_page(pid)?;
        if !page.is_empty() {
            return Err(anyhow!("corrupt free list: page ov{} holds {} tuple(s)", pid, page.tuple_count()));
        }
        self.head = page.overflow().unwrap_or(NO_PAGE);
        ovflow.write_page(pid, &Page::new(ovflow.page_size()))?;
        Ok(Some(pid))
    }

    /// Get an empty, unlinked overflow page: reuse the head of the list if
    /// any, else append a brand-new page to the overflow file.
    pub fn acquire(&mut self, ovflow: &mut PageFile) -> Result<u32> {
        if let Some(pid) = self.pop(ovflow)? {
            debug!("overflow page ov{} reused from free list", pid);
            record_overflow_reused();
            return Ok(pid);
        }
        let pid = ovflow.append_page(&Page::new(ovflow.page_size()))?;
        debug!("overflow page ov{} appended", pid);
        record_overflow_grown();
        Ok(pid)
    }

    /// Page ids on the list, head first.
    pub fn ids(&self, ovflow: &PageFile) -> Result<Vec<u32>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut pid = self.head;
        while pid != NO_PAGE {
            if out.len() >= MAX_CHAIN_LEN || !seen.insert(pid) {
                return Err(anyhow!("corrupt free list: loop detected at ov{}", pid));
            }
            out.push(pid);
            pid = ovflow.read_page(pid)?.overflow().unwrap_or(NO_PAGE);
        }
        Ok(out)
    }
}

pub(crate) fn fmt_pid(pid: u32) -> String {
    if pid == NO_PAGE {
        "none".to_string()
    } else {
        pid.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::PageKind;

    fn ovflow_file(tag: &str) -> (std::path::PathBuf, PageFile) {
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("malh-free-{}-{}-{}", tag, std::process::id(), t));
        let pf = PageFile::create(&path, 128, PageKind::Ovflow).unwrap();
        (path, pf)
    }

    #[test]
    fn acquire_prefers_free_pages() {
        let (path, mut ov) = ovflow_file("acq");
        let mut fl = FreeList::new(NO_PAGE);

        let a = fl.acquire(&mut ov).unwrap();
        let b = fl.acquire(&mut ov).unwrap();
        let c = fl.acquire(&mut ov).unwrap();
        assert_eq!((a, b, c), (0, 1, 2));

        fl.push(&mut ov, a).unwrap();
        fl.push(&mut ov, c).unwrap();
        assert_eq!(fl.ids(&ov).unwrap(), vec![c, a]);

        // LIFO, no growth while the list is non-empty
        assert_eq!(fl.acquire(&mut ov).unwrap(), c);
        assert_eq!(fl.acquire(&mut ov).unwrap(), a);
        assert_eq!(ov.page_count(), 3);
        assert!(fl.is_empty());
        assert_eq!(fl.acquire(&mut ov).unwrap(), 3);

        // popped pages come back clean
        let p = ov.read_page(a).unwrap();
        assert!(p.is_empty());
        assert_eq!(p.overflow(), None);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn push_resets_content() {
        let (path, mut ov) = ovflow_file("reset");
        let mut fl = FreeList::new(NO_PAGE);
        let pid = fl.acquire(&mut ov).unwrap();
        let mut p = ov.read_page(pid).unwrap();
        p.append_tuple("left,over").unwrap();
        ov.write_page(pid, &p).unwrap();

        fl.push(&mut ov, pid).unwrap();
        assert!(ov.read_page(pid).unwrap().is_empty());
        assert!(fl.push(&mut ov, pid).is_err());
        assert!(fl.push(&mut ov, 99).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
