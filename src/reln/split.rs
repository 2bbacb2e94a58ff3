//! reln/split — расщепление бакета sp.
//!
//! Порядок:
//! 1) append main page `sp + 2^d`;
//! 2) drain every tuple of bucket sp (main + overflow chain) into memory;
//! 3) empty the main page, cut its link and push the whole overflow tail
//!    onto the free list;
//! 4) re-place each tuple by its low d+1 bits (sp or the new sibling);
//!    new overflow pages for either bucket come off the free list first;
//! 5) unlink any overflow page of sp still empty onto the free list;
//! 6) advance sp, wrapping into d+1 after the last bucket of the round.
//!
//! The split pointer only moves after 1..5 succeed.

use anyhow::{anyhow, Result};
use log::debug;

use crate::consts::MAX_DEPTH;
use crate::error::RelnError;
use crate::metrics::record_split;
use crate::page::Page;
use crate::tuple::Tuple;
use crate::util::low_bits;

use super::chain::PageLoc;
use super::core::Relation;

impl Relation {
    /// Split bucket `sp`, growing the address space by one bucket.
    pub fn split(&mut self) -> Result<()> {
        self.ensure_writable()?;
        let d = self.meta.depth;
        let sp = self.meta.sp;
        let round = 1u32 << d;
        if d == MAX_DEPTH && sp + 1 == round {
            return Err(RelnError::BadGeometry(format!("address space exhausted at depth {}", d)).into());
        }
        let sibling = sp + round;

        let pid = self.data.append_page(&Page::new(self.meta.page_size as usize))?;
        if pid != sibling {
            return Err(anyhow!(
                "corrupt relation: new main page is d{}, expected d{}",
                pid,
                sibling
            ));
        }
        self.meta.npages += 1;

        // drain everything before touching any page
        let chain = self.chain(sp)?;
        let mut moved: Vec<(String, u32)> = Vec::new();
        for &loc in &chain {
            let page = self.read_loc(loc)?;
            for text in page.tuples()? {
                let t = Tuple::parse(text, self.meta.nattrs)?;
                let b = low_bits(t.hash(&self.meta.chvec), d + 1);
                debug_assert!(b == sp || b == sibling);
                if b != sp && b != sibling {
                    return Err(anyhow!("corrupt bucket {}: tuple '{}' hashes to {}", sp, text, b));
                }
                moved.push((text.to_string(), b));
            }
        }

        // main page loses its link first, then the detached tail is freed
        let mut main = self.data.read_page(sp)?;
        main.reset();
        self.data.write_page(sp, &main)?;
        let mut freed = 0u32;
        for loc in chain.iter().skip(1) {
            if let PageLoc::Ovflow(id) = *loc {
                self.free.push(&mut self.ovflow, id)?;
                freed += 1;
            }
        }
        self.sync_meta();

        let (mut stay, mut go) = (0u32, 0u32);
        for (text, b) in &moved {
            let b = *b;
            if b == sp {
                stay += 1;
            } else {
                go += 1;
            }
            self.append_to_chain(b, text)?;
        }

        let released = freed + self.reclaim_empty_overflow(sp)?;

        if sp + 1 == round {
            self.meta.sp = 0;
            self.meta.depth = d + 1;
        } else {
            self.meta.sp = sp + 1;
        }
        self.sync_meta();
        record_split();
        debug!(
            "split bucket {} -> {}: {} stayed, {} moved, {} overflow page(s) released; now d={} sp={}",
            sp, sibling, stay, go, released, self.meta.depth, self.meta.sp
        );
        Ok(())
    }
}
