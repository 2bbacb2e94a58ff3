//! Typed boundary errors.
//!
//! Everything else in the crate is reported through `anyhow`; these variants
//! exist so callers can tell rejected input apart from I/O or corruption via
//! `err.downcast_ref::<RelnError>()`. None of them leaves a side effect behind.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelnError {
    #[error("arity mismatch: relation has {expected} attribute(s), got {got}")]
    ArityMismatch { expected: u32, got: u32 },

    #[error("bad choice vector: {0}")]
    BadChoiceVector(String),

    #[error("bad tuple: {0}")]
    BadTuple(String),

    #[error("tuple of {len} bytes can never fit in a page (max {max})")]
    TupleTooLong { len: usize, max: usize },

    #[error("bad relation geometry: {0}")]
    BadGeometry(String),

    #[error("relation is open read-only")]
    ReadOnly,

    #[error("relation already exists at {}", .0.display())]
    AlreadyExists(PathBuf),
}

/// Returned by `Page::append_tuple` when the tuple does not fit.
/// Always recovered inside the relation manager by chaining.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("page full")]
pub struct PageFull;
