//! reln/stats — сводка по отношению (текст/JSON).
//!
//! Text form:
//! ```text
//! Global Info:
//! #attrs:3  #pages:4  #tuples:120  d:2  sp:0
//! Choice vector
//! 0,0:1,0:2,0:...
//! Bucket Info:
//! #    Info on pages in bucket
//!      (pageID,#tuples,freebytes,ovflow)
//! [ 0]  (d0,12,873,-1)
//! [ 1]  (d1,31,12,0) -> (ov0,4,920,-1)
//! ```

use anyhow::Result;
use serde::Serialize;
use std::fmt;

use crate::page::Page;
use crate::pager::PageKind;

use super::chain::PageLoc;
use super::core::Relation;

#[derive(Debug, Clone, Serialize)]
pub struct PageStats {
    pub kind: PageKind,
    pub id: u32,
    pub tuples: u32,
    pub free_bytes: u32,
    pub overflow: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketStats {
    pub bucket: u32,
    pub pages: Vec<PageStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelnStats {
    pub page_size: u32,
    pub nattrs: u32,
    pub depth: u32,
    pub sp: u32,
    pub npages: u32,
    pub ntuples: u32,
    pub split_every: u32,
    pub overflow_pages: u32,
    pub choice_vector: String,
    pub buckets: Vec<BucketStats>,
    pub free_pages: Vec<u32>,
}

fn page_stats(loc: PageLoc, page: &Page) -> PageStats {
    let (kind, id) = match loc {
        PageLoc::Main(id) => (PageKind::Data, id),
        PageLoc::Ovflow(id) => (PageKind::Ovflow, id),
    };
    PageStats {
        kind,
        id,
        tuples: page.tuple_count(),
        free_bytes: page.free_space() as u32,
        overflow: page.overflow(),
    }
}

impl Relation {
    /// Walk every bucket chain and the free list.
    pub fn stats(&self) -> Result<RelnStats> {
        let mut buckets = Vec::with_capacity(self.meta.npages as usize);
        for b in 0..self.meta.npages {
            let mut pages = Vec::new();
            for loc in self.chain(b)? {
                let page = self.read_loc(loc)?;
                pages.push(page_stats(loc, &page));
            }
            buckets.push(BucketStats { bucket: b, pages });
        }
        Ok(RelnStats {
            page_size: self.meta.page_size,
            nattrs: self.meta.nattrs,
            depth: self.meta.depth,
            sp: self.meta.sp,
            npages: self.meta.npages,
            ntuples: self.meta.ntuples,
            split_every: self.meta.split_every,
            overflow_pages: self.ovflow.page_count(),
            choice_vector: self.meta.chvec.to_string(),
            buckets,
            free_pages: self.free.ids(&self.ovflow)?,
        })
    }
}

impl fmt::Display for PageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            PageKind::Data => "d",
            PageKind::Ovflow => "ov",
        };
        // -1 for "no overflow", as in the classic dump
        let ov = self.overflow.map(i64::from).unwrap_or(-1);
        write!(f, "({}{},{},{},{})", prefix, self.id, self.tuples, self.free_bytes, ov)
    }
}

impl fmt::Display for RelnStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Global Info:")?;
        writeln!(
            f,
            "#attrs:{}  #pages:{}  #tuples:{}  d:{}  sp:{}",
            self.nattrs, self.npages, self.ntuples, self.depth, self.sp
        )?;
        writeln!(f, "Choice vector")?;
        writeln!(f, "{}", self.choice_vector)?;
        writeln!(f, "Bucket Info:")?;
        writeln!(f, "{:<4} Info on pages in bucket", "#")?;
        writeln!(f, "{:<4} (pageID,#tuples,freebytes,ovflow)", "")?;
        for b in &self.buckets {
            write!(f, "[{:>2}]  ", b.bucket)?;
            for (i, p) in b.pages.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", p)?;
            }
            writeln!(f)?;
        }
        if !self.free_pages.is_empty() {
            let ids: Vec<String> = self.free_pages.iter().map(|id| format!("ov{}", id)).collect();
            writeln!(f, "Free list: {}", ids.join(" -> "))?;
        }
        Ok(())
    }
}
