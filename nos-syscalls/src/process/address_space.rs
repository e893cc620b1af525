//! Page-granular user address space
//!
//! Backs `CopyOut` with a sparse page map. `copy_out` follows the same two
//! passes as the page-table walker: check every page in the destination
//! range (present, writable, inside user space), then copy page-sized
//! chunks. A refused range is never partially written.

use alloc::boxed::Box;
use alloc::vec;
use core::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::HashMap;
use spin::Mutex;

use nos_api::error::invalid_argument;
use nos_api::{PAGE_SIZE, Result, VirtAddr};

use super::copyout::{CopyFault, CopyFaultKind, CopyOut};

struct Page {
    data: Box<[u8]>,
    writable: bool,
}

impl Page {
    fn zeroed(writable: bool) -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE].into_boxed_slice(),
            writable,
        }
    }
}

/// Sparse user address space for one process
pub struct UserAddressSpace {
    pages: Mutex<HashMap<usize, Page>>,
    limit: VirtAddr,
    copies: AtomicUsize,
}

fn page_of(va: VirtAddr) -> usize {
    va / PAGE_SIZE
}

impl UserAddressSpace {
    /// Empty address space whose user range ends (exclusive) at `limit`
    pub fn new(limit: VirtAddr) -> Self {
        Self {
            pages: Mutex::new(HashMap::new()),
            limit,
            copies: AtomicUsize::new(0),
        }
    }

    fn page_span(&self, va: VirtAddr, len: usize) -> Result<(usize, usize)> {
        let end = va
            .checked_add(len)
            .ok_or_else(|| invalid_argument("range wraps the address space"))?;
        if end > self.limit {
            return Err(invalid_argument("range leaves user space"));
        }
        Ok((page_of(va), end.div_ceil(PAGE_SIZE)))
    }

    /// Map zeroed pages covering `va..va + len`. Already-mapped pages keep
    /// their contents and take the new permission.
    pub fn map(&self, va: VirtAddr, len: usize, writable: bool) -> Result<()> {
        let (first, last) = self.page_span(va, len)?;
        let mut pages = self.pages.lock();
        for page in first..last {
            pages
                .entry(page)
                .and_modify(|p| p.writable = writable)
                .or_insert_with(|| Page::zeroed(writable));
        }
        Ok(())
    }

    /// Drop every page touching `va..va + len`
    pub fn unmap(&self, va: VirtAddr, len: usize) -> Result<()> {
        let (first, last) = self.page_span(va, len)?;
        let mut pages = self.pages.lock();
        for page in first..last {
            pages.remove(&page);
        }
        Ok(())
    }

    /// Change write permission on already-mapped pages
    pub fn protect(&self, va: VirtAddr, len: usize, writable: bool) -> Result<()> {
        let (first, last) = self.page_span(va, len)?;
        let mut pages = self.pages.lock();
        for page in first..last {
            match pages.get_mut(&page) {
                Some(p) => p.writable = writable,
                None => return Err(invalid_argument("protect on unmapped page")),
            }
        }
        Ok(())
    }

    /// Read user memory back into `out`. Used by callers inspecting their
    /// own buffer; the snapshot path never reads.
    pub fn read(&self, va: VirtAddr, out: &mut [u8]) -> core::result::Result<(), CopyFault> {
        let pages = self.pages.lock();
        let mut done = 0;
        while done < out.len() {
            let addr = va + done;
            let off = addr % PAGE_SIZE;
            let chunk = (out.len() - done).min(PAGE_SIZE - off);
            let page = pages
                .get(&page_of(addr))
                .ok_or(CopyFault::new(addr, CopyFaultKind::Unmapped))?;
            out[done..done + chunk].copy_from_slice(&page.data[off..off + chunk]);
            done += chunk;
        }
        Ok(())
    }

    /// Number of `copy_out` calls that wrote data
    pub fn copies(&self) -> usize {
        self.copies.load(Ordering::Relaxed)
    }
}

impl CopyOut for UserAddressSpace {
    fn copy_out(&self, dst: VirtAddr, src: &[u8]) -> core::result::Result<(), CopyFault> {
        if src.is_empty() {
            return Ok(());
        }
        if dst == 0 {
            return Err(CopyFault::new(dst, CopyFaultKind::Malformed));
        }
        let end = match dst.checked_add(src.len()) {
            Some(end) if end <= self.limit => end,
            _ => return Err(CopyFault::new(dst, CopyFaultKind::Malformed)),
        };

        let mut pages = self.pages.lock();
        for page in page_of(dst)..=page_of(end - 1) {
            let addr = (page * PAGE_SIZE).max(dst);
            match pages.get(&page) {
                None => return Err(CopyFault::new(addr, CopyFaultKind::Unmapped)),
                Some(p) if !p.writable => return Err(CopyFault::new(addr, CopyFaultKind::ReadOnly)),
                Some(_) => {}
            }
        }

        let mut copied = 0;
        while copied < src.len() {
            let addr = dst + copied;
            let off = addr % PAGE_SIZE;
            let chunk = (src.len() - copied).min(PAGE_SIZE - off);
            if let Some(page) = pages.get_mut(&page_of(addr)) {
                page.data[off..off + chunk].copy_from_slice(&src[copied..copied + chunk]);
            }
            copied += chunk;
        }
        self.copies.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
