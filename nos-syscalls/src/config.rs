//! Snapshot configuration
//!
//! Values the kernel build fixes for `getprocs`: how many table slots exist,
//! where user space ends, and how descriptors reach the caller.

use nos_api::Result;
use nos_api::error::config_error;
use nos_api::process::{DESCRIPTOR_SIZE, NPROC};
use nos_api::VirtAddr;

/// One past the highest user virtual address (Sv39 with the top bit unused).
pub const MAXVA: VirtAddr = 1 << (9 + 9 + 9 + 12 - 1);

/// How descriptors are written into the caller's buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// One copy per descriptor field, issued while the entry is locked.
    /// A fault can leave earlier descriptors written.
    #[default]
    PerField,
    /// Encode the whole snapshot locally, then issue a single copy after
    /// every lock is dropped. A fault leaves the buffer untouched.
    #[cfg(feature = "alloc")]
    Staged,
}

/// `getprocs` configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// Number of process table slots; also the largest count a caller may ask for
    pub table_capacity: usize,
    /// One past the highest address a destination buffer may reach
    pub max_user_address: VirtAddr,
    /// Descriptor transfer strategy
    pub transfer_mode: TransferMode,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            table_capacity: NPROC,
            max_user_address: MAXVA,
            transfer_mode: TransferMode::PerField,
        }
    }
}

impl SnapshotConfig {
    pub fn with_table_capacity(mut self, capacity: usize) -> Self {
        self.table_capacity = capacity;
        self
    }

    pub fn with_max_user_address(mut self, addr: VirtAddr) -> Self {
        self.max_user_address = addr;
        self
    }

    pub fn with_transfer_mode(mut self, mode: TransferMode) -> Self {
        self.transfer_mode = mode;
        self
    }

    /// Check that the configuration can describe a usable snapshot.
    ///
    /// Capacity must fit the signed count argument, and a full-table buffer
    /// must be expressible without overflow.
    pub fn validate(&self) -> Result<()> {
        if self.table_capacity > i32::MAX as usize {
            return Err(config_error("table capacity exceeds the count argument range"));
        }
        if self.table_capacity.checked_mul(DESCRIPTOR_SIZE).is_none() {
            return Err(config_error("full-table buffer size overflows"));
        }
        if self.max_user_address == 0 {
            return Err(config_error("user address space is empty"));
        }
        Ok(())
    }
}
