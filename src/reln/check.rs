//! reln/check — проверка инвариантов отношения.
//!
//! Walks every bucket chain and the free list and verifies:
//! - page headers decode and tuple counts agree with the packed data;
//! - every tuple parses with the relation's arity and addresses to the
//!   bucket whose chain holds it;
//! - the tuple total equals the persisted count;
//! - no overflow page is reachable twice (chains and free list together);
//! - free-list pages are empty;
//! - every overflow page is either in a chain or on the free list.
//!
//! Errors mention "corrupt"; nothing is repaired.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::tuple::Tuple;

use super::chain::PageLoc;
use super::core::Relation;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub buckets: u32,
    pub main_pages: u32,
    pub overflow_pages: u32,
    pub free_pages: u32,
    pub tuples: u64,
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ok: buckets={} main_pages={} overflow_pages={} free_pages={} tuples={}",
            self.buckets, self.main_pages, self.overflow_pages, self.free_pages, self.tuples
        )
    }
}

impl Relation {
    pub fn check(&self) -> Result<CheckReport> {
        let mut rep = CheckReport::default();
        let mut seen_ov: HashSet<u32> = HashSet::new();

        for b in 0..self.meta.npages {
            rep.buckets += 1;
            for loc in self.chain(b)? {
                match loc {
                    PageLoc::Main(_) => rep.main_pages += 1,
                    PageLoc::Ovflow(id) => {
                        if !seen_ov.insert(id) {
                            return Err(anyhow!("corrupt: ov{} appears in more than one chain", id));
                        }
                        rep.overflow_pages += 1;
                    }
                }
                let page = self.read_loc(loc)?;
                for text in page.tuples()? {
                    let t = Tuple::parse(text, self.meta.nattrs)
                        .map_err(|e| anyhow!("corrupt: tuple '{}' in {}: {}", text, loc, e))?;
                    let home = self.bucket_of(t.hash(&self.meta.chvec));
                    if home != b {
                        return Err(anyhow!(
                            "corrupt: tuple '{}' stored in bucket {} ({}) but addresses to {}",
                            text,
                            b,
                            loc,
                            home
                        ));
                    }
                    rep.tuples += 1;
                }
            }
        }

        for id in self.free.ids(&self.ovflow)? {
            if !seen_ov.insert(id) {
                return Err(anyhow!("corrupt: ov{} is both in a chain and on the free list", id));
            }
            let page = self.ovflow.read_page(id)?;
            if !page.is_empty() {
                return Err(anyhow!("corrupt: free page ov{} holds {} tuple(s)", id, page.tuple_count()));
            }
            rep.free_pages += 1;
        }

        let total = self.ovflow.page_count() as usize;
        if seen_ov.len() != total {
            return Err(anyhow!(
                "corrupt: {} of {} overflow page(s) unreachable from chains and free list",
                total - seen_ov.len(),
                total
            ));
        }

        if rep.tuples != self.meta.ntuples as u64 {
            return Err(anyhow!(
                "corrupt: found {} tuples, relation records {}",
                rep.tuples,
                self.meta.ntuples
            ));
        }
        Ok(rep)
    }
}
