//! Общие константы форматов (meta, pages, relation files).

// -------- Relation files --------
pub const INFO_EXT: &str = "info";
pub const DATA_EXT: &str = "data";
pub const OVFLOW_EXT: &str = "ovflow";
pub const LOCK_EXT: &str = "lock";

// -------- Meta --------
pub const META_MAGIC: &[u8; 8] = b"MALHREL1";
pub const META_VERSION: u32 = 1;

// -------- Pages --------
/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 1024;
pub const MIN_PAGE_SIZE: u32 = 128;
pub const MAX_PAGE_SIZE: u32 = 1 << 20;

// Layout: [free_offset u32][overflow_link u32][tuple_count u32][data ...]
pub const PAGE_HDR_SIZE: usize = 12;
pub const OFF_FREE: usize = 0;
pub const OFF_OVFLOW: usize = 4;
pub const OFF_NTUPLES: usize = 8;

/// Sentinel for "no page" in overflow links and the free-list head.
pub const NO_PAGE: u32 = u32::MAX;

// -------- Hashing / choice vector --------
/// Width of a hash word and number of choice-vector entries.
pub const MAX_BITS: usize = 32;
pub const MAX_CHVEC: usize = MAX_BITS;
/// Deepest address space we allow (depth + 1 must still fit in a u32 word).
pub const MAX_DEPTH: u32 = 31;

// -------- Tuples --------
pub const FIELD_SEP: char = ',';
pub const WILDCARD: &str = "?";

/// Guard for chain walks: a chain longer than this is treated as a loop.
pub const MAX_CHAIN_LEN: usize = 1_000_000;
