//! query — частично заданные запросы (`?` = любое значение).
//!
//! The query text is parsed once into per-attribute hashes; through the
//! choice vector these give `known` (bit values) and `mask` (which output
//! bits are fixed). Bucket `b` can hold a match only if it agrees with
//! `known` on every masked bit that is significant for its tier:
//! - `b < sp` or `b >= 2^d`: d+1 bits (already split / new sibling);
//! - otherwise: d bits.
//!
//! Candidates are visited in increasing order, each as main page then
//! overflow chain. `next_tuple` yields one match per call and resumes at
//! the saved page and byte offset.

use anyhow::{anyhow, Result};
use log::debug;

use crate::consts::MAX_CHAIN_LEN;
use crate::page::Page;
use crate::reln::Relation;
use crate::tuple::Tuple;
use crate::util::{bits_string, low_mask, Bits};

/// Cursor over the matches of one query. Borrows the relation read-only,
/// so the relation cannot change while a scan is open.
pub struct Query<'r> {
    reln: &'r Relation,
    query: Tuple,
    known: Bits,
    mask: Bits,
    // bucket being scanned; None before the first one
    bucket: Option<u32>,
    page: Option<Page>,
    offset: usize,
    hops: usize,
    done: bool,
}

impl Relation {
    /// Start a scan for `text` (`f1,...,fn`, any field may be `?`).
    pub fn query(&self, text: &str) -> Result<Query<'_>> {
        Query::start(self, text)
    }
}

impl<'r> Query<'r> {
    pub fn start(reln: &'r Relation, text: &str) -> Result<Self> {
        let query = Tuple::parse(text, reln.nattrs())?;
        let (known, mask) = reln.choice_vector().combine_partial(&query.partial_hashes());
        debug!(
            "query '{}': known={} mask={}",
            text,
            bits_string(known),
            bits_string(mask)
        );
        Ok(Self {
            reln,
            query,
            known,
            mask,
            bucket: None,
            page: None,
            offset: 0,
            hops: 0,
            done: false,
        })
    }

    /// Known hash bits and the mask of bits the query fixes.
    pub fn known_bits(&self) -> (Bits, Bits) {
        (self.known, self.mask)
    }

    /// Is bucket `b` consistent with the query under the current (d, sp)?
    pub fn is_candidate(&self, b: u32) -> bool {
        let d = self.reln.depth();
        let sp = self.reln.split_pointer();
        let bits = if b < sp || b >= (1u32 << d) { d + 1 } else { d };
        ((b ^ self.known) & self.mask & low_mask(bits)) == 0
    }

    /// All consistent buckets, increasing.
    pub fn candidate_buckets(&self) -> Vec<u32> {
        (0..self.reln.npages()).filter(|&b| self.is_candidate(b)).collect()
    }

    fn next_bucket(&self) -> Option<u32> {
        let from = match self.bucket {
            None => 0,
            Some(b) => b.checked_add(1)?,
        };
        (from..self.reln.npages()).find(|&b| self.is_candidate(b))
    }

    /// Next matching tuple, or None at end of scan.
    pub fn next_tuple(&mut self) -> Result<Option<String>> {
        let res = self.advance();
        if res.is_err() {
            self.done = true;
        }
        res
    }

    fn advance(&mut self) -> Result<Option<String>> {
        loop {
            if self.done {
                return Ok(None);
            }
            if self.page.is_none() {
                match self.next_bucket() {
                    Some(b) => {
                        self.bucket = Some(b);
                        self.page = Some(self.reln.data.read_page(b)?);
                        self.offset = 0;
                        self.hops = 0;
                    }
                    None => self.done = true,
                }
                continue;
            }
            let page = match &self.page {
                Some(p) => p,
                None => continue,
            };

            let link = page.overflow();
            let step = match page.tuple_at(self.offset)? {
                Some((text, next)) => {
                    let stored = Tuple::parse(text, self.reln.nattrs())
                        .map_err(|e| anyhow!("corrupt tuple '{}': {}", text, e))?;
                    let hit = self.query.matches(&stored).then(|| text.to_string());
                    Some((next, hit))
                }
                None => None,
            };

            match step {
                Some((next, hit)) => {
                    self.offset = next;
                    if hit.is_some() {
                        return Ok(hit);
                    }
                }
                None => match link {
                    Some(id) => {
                        self.hops += 1;
                        if self.hops > MAX_CHAIN_LEN {
                            return Err(anyhow!("corrupt chain: loop at ov{}", id));
                        }
                        self.page = Some(self.reln.ovflow.read_page(id)?);
                        self.offset = 0;
                    }
                    None => self.page = None,
                },
            }
        }
    }

    /// Release the cursor.
    pub fn close(self) {}
}

impl Iterator for Query<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_tuple().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelnConfig;
    use crate::reln::OpenMode;

    fn tmp_name(tag: &str) -> std::path::PathBuf {
        let t = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("malh-query-{}-{}-{}", tag, std::process::id(), t))
    }

    #[test]
    fn full_wildcard_visits_every_bucket() {
        let name = tmp_name("all");
        Relation::builder(&name)
            .attrs(2)
            .depth(2)
            .config(RelnConfig::default())
            .create()
            .unwrap();
        let r = Relation::open(&name, OpenMode::ReadOnly).unwrap();
        let q = r.query("?,?").unwrap();
        assert_eq!(q.known_bits(), (0, 0));
        assert_eq!(q.candidate_buckets(), vec![0, 1, 2, 3]);
        assert!(r.query("?").is_err());
    }
}
