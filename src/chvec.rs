//! chvec — choice vector: which bit of which attribute hash feeds each
//! output bit of a tuple's bucket hash.
//!
//! Text format: exactly 32 colon-separated `attr,bit` items, e.g.
//! `"0,0:1,0:2,0:0,1:1,1:..."`. Item `i` describes output bit `i`.

use anyhow::Result;
use std::fmt;
use std::str::FromStr;

use crate::consts::{MAX_BITS, MAX_CHVEC};
use crate::error::RelnError;
use crate::util::{bit_is_set, set_bit, Bits};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct ChVecItem {
    pub attr: u32,
    pub bit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChoiceVector {
    items: [ChVecItem; MAX_CHVEC],
}

impl ChoiceVector {
    /// Parse a choice vector for a relation with `nattrs` attributes.
    pub fn parse(spec: &str, nattrs: u32) -> Result<Self> {
        let parts: Vec<&str> = spec.trim().split(':').collect();
        if parts.len() != MAX_CHVEC {
            return Err(RelnError::BadChoiceVector(format!(
                "expected {} items, got {}",
                MAX_CHVEC,
                parts.len()
            ))
            .into());
        }

        let mut items = [ChVecItem::default(); MAX_CHVEC];
        for (i, part) in parts.iter().enumerate() {
            items[i] = part.parse::<ChVecItem>().map_err(|e| match e {
                RelnError::BadChoiceVector(msg) => {
                    RelnError::BadChoiceVector(format!("item {}: {}", i, msg))
                }
                other => other,
            })?;
        }

        let cv = Self { items };
        cv.validate(nattrs)?;
        Ok(cv)
    }

    /// Output bit `i` takes attribute `i % nattrs`, bit `i / nattrs`.
    pub fn round_robin(nattrs: u32) -> Result<Self> {
        if nattrs == 0 {
            return Err(RelnError::BadChoiceVector("relation has no attributes".into()).into());
        }
        let mut items = [ChVecItem::default(); MAX_CHVEC];
        for (i, it) in items.iter_mut().enumerate() {
            let i = i as u32;
            *it = ChVecItem {
                attr: i % nattrs,
                bit: i / nattrs,
            };
        }
        Ok(Self { items })
    }

    pub fn from_items(items: [ChVecItem; MAX_CHVEC], nattrs: u32) -> Result<Self> {
        let cv = Self { items };
        cv.validate(nattrs)?;
        Ok(cv)
    }

    pub fn validate(&self, nattrs: u32) -> Result<()> {
        for (i, it) in self.items.iter().enumerate() {
            if it.attr >= nattrs {
                return Err(RelnError::BadChoiceVector(format!(
                    "item {}: attribute {} out of range 0..{}",
                    i, it.attr, nattrs
                ))
                .into());
            }
            if it.bit as usize >= MAX_BITS {
                return Err(RelnError::BadChoiceVector(format!(
                    "item {}: bit {} out of range 0..{}",
                    i, it.bit, MAX_BITS
                ))
                .into());
            }
        }
        Ok(())
    }

    #[inline]
    pub fn items(&self) -> &[ChVecItem; MAX_CHVEC] {
        &self.items
    }

    /// Interleave per-attribute hashes into one bucket hash.
    /// Attributes missing from `attr_hashes` contribute zero bits.
    pub fn combine(&self, attr_hashes: &[Bits]) -> Bits {
        let mut out: Bits = 0;
        for (i, it) in self.items.iter().enumerate() {
            let set = attr_hashes
                .get(it.attr as usize)
                .is_some_and(|&h| bit_is_set(h, it.bit));
            if set {
                out = set_bit(out, i as u32);
            }
        }
        out
    }

    /// Like `combine`, but attributes that are `None` or missing are unknown.
    /// Returns (known bits, mask of constrained output bits).
    pub fn combine_partial(&self, attr_hashes: &[Option<Bits>]) -> (Bits, Bits) {
        let mut known: Bits = 0;
        let mut mask: Bits = 0;
        for (i, it) in self.items.iter().enumerate() {
            if let Some(&Some(h)) = attr_hashes.get(it.attr as usize) {
                mask = set_bit(mask, i as u32);
                if bit_is_set(h, it.bit) {
                    known = set_bit(known, i as u32);
                }
            }
        }
        (known, mask)
    }
}

impl fmt::Display for ChoiceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, it) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{},{}", it.attr, it.bit)?;
        }
        Ok(())
    }
}

impl FromStr for ChVecItem {
    type Err = RelnError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(',')
            .ok_or_else(|| RelnError::BadChoiceVector(format!("'{}' is not attr,bit", s)))?;
        let num = |x: &str| {
            x.trim()
                .parse::<u32>()
                .map_err(|_| RelnError::BadChoiceVector(format!("'{}' is not a number", x.trim())))
        };
        Ok(ChVecItem {
            attr: num(a)?,
            bit: num(b)?,
        })
    }
}
