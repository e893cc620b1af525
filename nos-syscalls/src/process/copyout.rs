//! Kernel-to-user copy channel
//!
//! The memory manager owns page tables; this module only fixes the contract
//! the snapshot code relies on. A copy either lands completely or reports
//! the first address it refused.

use core::fmt;

use nos_api::VirtAddr;

/// Why a destination range was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyFaultKind {
    /// Null, wrapping, or outside user space
    Malformed,
    /// A page in the range has no mapping
    Unmapped,
    /// A page in the range is mapped read-only
    ReadOnly,
}

/// A refused copy into user memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyFault {
    /// First offending address
    pub addr: VirtAddr,
    pub kind: CopyFaultKind,
}

impl CopyFault {
    pub fn new(addr: VirtAddr, kind: CopyFaultKind) -> Self {
        Self { addr, kind }
    }
}

impl fmt::Display for CopyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            CopyFaultKind::Malformed => "malformed range",
            CopyFaultKind::Unmapped => "unmapped page",
            CopyFaultKind::ReadOnly => "read-only page",
        };
        write!(f, "copyout fault at {:#x}: {}", self.addr, what)
    }
}

/// Validated write primitive into one address space.
///
/// Implementations must check every page of `dst..dst + src.len()` before
/// writing any byte of it. The channel is write-only: nothing on this path
/// reads user memory back.
pub trait CopyOut {
    fn copy_out(&self, dst: VirtAddr, src: &[u8]) -> Result<(), CopyFault>;
}
