//! Stable hashing of attribute values.
//!
//! Goals:
//! - Use a stable, explicit hash (not std::DefaultHasher) so bucket placement
//!   is invariant across runs, toolchains and platforms.
//! - Feed raw bytes only: no length prefix, no platform-sized integers.
//! - Encode the hash kind for forward compatibility of the on-disk format.

use std::fmt;
use std::hash::Hasher;
use twox_hash::XxHash32;

use crate::util::Bits;

/// Type of stable hash used by relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// 32-bit xxhash with seed=0.
    Xx32Seed0 = 1,
}

impl HashKind {
    pub fn to_u32(self) -> u32 {
        match self {
            HashKind::Xx32Seed0 => 1,
        }
    }

    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            1 => Some(HashKind::Xx32Seed0),
            _ => None,
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKind::Xx32Seed0 => write!(f, "xxhash32(seed=0)"),
        }
    }
}

pub const HASH_KIND_DEFAULT: HashKind = HashKind::Xx32Seed0;

/// 32-bit hash of a byte string for the given kind.
pub fn hash32(kind: HashKind, bytes: &[u8]) -> Bits {
    match kind {
        HashKind::Xx32Seed0 => {
            let mut h = XxHash32::with_seed(0);
            h.write(bytes);
            h.finish() as Bits
        }
    }
}

/// Hash of a single attribute value with the crate-wide default kind.
#[inline]
pub fn hash_value(value: &str) -> Bits {
    hash32(HASH_KIND_DEFAULT, value.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_and_sensitive() {
        let a = hash_value("1234");
        assert_eq!(a, hash_value("1234"));
        assert_ne!(a, hash_value("1235"));
        assert_ne!(hash_value(""), hash_value(" "));
    }

    #[test]
    fn kind_code_roundtrip() {
        assert_eq!(HashKind::from_u32(HASH_KIND_DEFAULT.to_u32()), Some(HASH_KIND_DEFAULT));
        assert_eq!(HashKind::from_u32(7), None);
    }
}
