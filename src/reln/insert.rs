//! reln/insert — вставка кортежа.
//!
//! A split (when due) runs before the tuple is placed, so the new tuple is
//! addressed with the post-split depth and split pointer.

use anyhow::Result;

use crate::error::RelnError;
use crate::metrics::record_tuple_inserted;
use crate::tuple::Tuple;

use super::core::Relation;

impl Relation {
    /// Insert one tuple (`f1,f2,...,fn`); returns the bucket it landed in.
    pub fn insert(&mut self, text: &str) -> Result<u32> {
        self.ensure_writable()?;
        let tuple = Tuple::parse(text, self.meta.nattrs)?;
        if tuple.len() > self.max_tuple_len() {
            return Err(RelnError::TupleTooLong {
                len: tuple.len(),
                max: self.max_tuple_len(),
            }
            .into());
        }

        if self.split_due() {
            self.split()?;
        }

        let bucket = self.bucket_of(tuple.hash(&self.meta.chvec));
        self.append_to_chain(bucket, tuple.as_str())?;
        self.meta.ntuples += 1;
        record_tuple_inserted();
        Ok(bucket)
    }

    #[inline]
    fn split_due(&self) -> bool {
        self.meta.ntuples > 0 && self.meta.ntuples % self.meta.split_every == 0
    }
}
