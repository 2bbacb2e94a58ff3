//! tuple — текстовые кортежи `f1,f2,...,fn`.
//!
//! The wire format stays plain text (comma-separated, no NUL, no comma inside
//! a field). Internally a tuple is parsed once into field boundaries and all
//! hashing/matching works on those, never on re-scanned raw bytes.

use anyhow::Result;
use std::fmt;
use std::ops::Range;

use crate::chvec::ChoiceVector;
use crate::consts::{FIELD_SEP, WILDCARD};
use crate::error::RelnError;
use crate::hash::hash_value;
use crate::util::Bits;

/// Split raw text on the field separator.
pub fn split_fields(text: &str) -> Vec<&str> {
    text.split(FIELD_SEP).collect()
}

/// A tuple with its fields located once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    text: String,
    bounds: Vec<Range<usize>>,
}

impl Tuple {
    /// Parse `text`, requiring exactly `nattrs` fields.
    pub fn parse(text: &str, nattrs: u32) -> Result<Self> {
        if text.as_bytes().contains(&0) {
            return Err(RelnError::BadTuple("tuple contains a NUL byte".into()).into());
        }
        let mut bounds = Vec::with_capacity(nattrs as usize);
        let mut start = 0usize;
        for (i, c) in text.char_indices() {
            if c == FIELD_SEP {
                bounds.push(start..i);
                start = i + c.len_utf8();
            }
        }
        bounds.push(start..text.len());

        if bounds.len() != nattrs as usize {
            return Err(RelnError::ArityMismatch {
                expected: nattrs,
                got: bounds.len() as u32,
            }
            .into());
        }
        Ok(Self {
            text: text.to_string(),
            bounds,
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes, excluding the page terminator.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.bounds.len()
    }

    #[inline]
    pub fn field(&self, i: usize) -> Option<&str> {
        self.bounds.get(i).map(|r| &self.text[r.clone()])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.bounds.iter().map(move |r| &self.text[r.clone()])
    }

    /// Independent hash of every field.
    pub fn attr_hashes(&self) -> Vec<Bits> {
        self.fields().map(hash_value).collect()
    }

    /// Bucket hash: field hashes interleaved through the choice vector.
    pub fn hash(&self, cv: &ChoiceVector) -> Bits {
        cv.combine(&self.attr_hashes())
    }

    /// Field hashes for a query tuple; wildcard fields are `None`.
    pub fn partial_hashes(&self) -> Vec<Option<Bits>> {
        self.fields()
            .map(|f| if is_wildcard(f) { None } else { Some(hash_value(f)) })
            .collect()
    }

    /// Does this (query) tuple match `stored`? Wildcard fields always match.
    pub fn matches(&self, stored: &Tuple) -> bool {
        debug_assert_eq!(self.arity(), stored.arity());
        self.fields()
            .zip(stored.fields())
            .all(|(q, s)| is_wildcard(q) || q == s)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[inline]
pub fn is_wildcard(field: &str) -> bool {
    field == WILDCARD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fields_and_arity() {
        let t = Tuple::parse("1234,ab,,z", 4).unwrap();
        let got: Vec<&str> = t.fields().collect();
        assert_eq!(got, vec!["1234", "ab", "", "z"]);
        assert_eq!(t.field(1), Some("ab"));
        assert_eq!(t.field(4), None);
        assert_eq!(t.len(), 10);

        let err = Tuple::parse("1,2", 3).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RelnError>(),
            Some(&RelnError::ArityMismatch { expected: 3, got: 2 })
        );
        assert!(Tuple::parse("a\0b", 1).is_err());
    }

    #[test]
    fn wildcard_matching() {
        let q = Tuple::parse("1234,?,?", 3).unwrap();
        for (s, want) in [("1234,56,78", true), ("1234,00,00", true), ("5678,56,78", false)] {
            let st = Tuple::parse(s, 3).unwrap();
            assert_eq!(q.matches(&st), want, "{}", s);
        }
        // a stored '?' is an ordinary value
        let exact = Tuple::parse("1,2", 2).unwrap();
        assert!(!exact.matches(&Tuple::parse("1,?", 2).unwrap()));
        // '??' is not a wildcard
        let qq = Tuple::parse("??,2", 2).unwrap();
        assert!(!qq.matches(&Tuple::parse("x,2", 2).unwrap()));
        assert_eq!(split_fields("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn hash_uses_choice_vector() {
        let cv = ChoiceVector::round_robin(2).unwrap();
        let t = Tuple::parse("a,b", 2).unwrap();
        assert_eq!(t.hash(&cv), cv.combine(&[hash_value("a"), hash_value("b")]));

        let q = Tuple::parse("a,?", 2).unwrap();
        let (known, mask) = cv.combine_partial(&q.partial_hashes());
        // attribute 0 feeds the even output bits
        assert_eq!(mask, 0x5555_5555);
        assert_eq!(known, t.hash(&cv) & mask);
    }
}
