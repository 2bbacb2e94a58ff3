//! page/header — заголовок страницы и базовые операции.
//!
//! Layout (LE, 12 bytes):
//! [free_offset u32][overflow_link u32][tuple_count u32]

use anyhow::{anyhow, Result};
use byteorder::{ByteOrder, LittleEndian};

use crate::consts::{NO_PAGE, OFF_FREE, OFF_NTUPLES, OFF_OVFLOW, PAGE_HDR_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// First free byte of the data area.
    pub free_offset: u32,
    /// Next page of the chain, or NO_PAGE.
    pub overflow_link: u32,
    pub tuple_count: u32,
}

impl PageHeader {
    pub fn empty() -> Self {
        Self {
            free_offset: 0,
            overflow_link: NO_PAGE,
            tuple_count: 0,
        }
    }
}

/// Read and sanity-check the header of a raw page buffer.
pub fn page_header_read(page: &[u8]) -> Result<PageHeader> {
    if page.len() <= PAGE_HDR_SIZE {
        return Err(anyhow!("page buffer too small for header ({} B)", page.len()));
    }
    let h = PageHeader {
        free_offset: LittleEndian::read_u32(&page[OFF_FREE..OFF_FREE + 4]),
        overflow_link: LittleEndian::read_u32(&page[OFF_OVFLOW..OFF_OVFLOW + 4]),
        tuple_count: LittleEndian::read_u32(&page[OFF_NTUPLES..OFF_NTUPLES + 4]),
    };
    let cap = page.len() - PAGE_HDR_SIZE;
    if h.free_offset as usize > cap {
        return Err(anyhow!(
            "corrupt page header: free_offset {} beyond data capacity {}",
            h.free_offset,
            cap
        ));
    }
    if h.tuple_count > h.free_offset {
        return Err(anyhow!(
            "corrupt page header: {} tuples in {} bytes",
            h.tuple_count,
            h.free_offset
        ));
    }
    Ok(h)
}

pub fn page_header_write(page: &mut [u8], h: &PageHeader) {
    LittleEndian::write_u32(&mut page[OFF_FREE..OFF_FREE + 4], h.free_offset);
    LittleEndian::write_u32(&mut page[OFF_OVFLOW..OFF_OVFLOW + 4], h.overflow_link);
    LittleEndian::write_u32(&mut page[OFF_NTUPLES..OFF_NTUPLES + 4], h.tuple_count);
}
