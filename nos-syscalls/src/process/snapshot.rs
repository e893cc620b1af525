//! Process table snapshot
//!
//! Walks the table in slot order under the table-wide lock, captures each
//! live entry under its own lock, and hands the caller one
//! `ProcessDescriptor` per entry. Each descriptor is consistent with itself;
//! two descriptors from the same walk may reflect different instants.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "alloc")]
use nos_api::process::DESCRIPTOR_SIZE;
use nos_api::process::ProcessDescriptor;

use super::copyout::{CopyFault, CopyOut};
use super::table::ProcessTable;
use super::validate::ValidatedRequest;
use crate::config::TransferMode;
use crate::{sys_trace, sys_warn};

/// Builds descriptors from a table and writes them through a copy channel
pub struct SnapshotCollector<'a, T: ProcessTable + ?Sized, C: CopyOut + ?Sized> {
    table: &'a T,
    channel: &'a C,
    mode: TransferMode,
}

impl<'a, T: ProcessTable + ?Sized, C: CopyOut + ?Sized> SnapshotCollector<'a, T, C> {
    pub fn new(table: &'a T, channel: &'a C, mode: TransferMode) -> Self {
        Self { table, channel, mode }
    }

    /// Write up to `request.max()` descriptors and return how many were
    /// written. On a fault the count is lost and the buffer must be treated
    /// as garbage.
    pub fn collect(&self, request: &ValidatedRequest) -> Result<usize, CopyFault> {
        if request.max() == 0 {
            return Ok(0);
        }
        let count = match self.mode {
            TransferMode::PerField => self.collect_per_field(request)?,
            #[cfg(feature = "alloc")]
            TransferMode::Staged => self.collect_staged(request)?,
        };
        sys_trace!("getprocs: {} descriptors to {:#x}", count, request.dst());
        Ok(count)
    }

    fn collect_per_field(&self, request: &ValidatedRequest) -> Result<usize, CopyFault> {
        self.walk(request.max(), |index, desc| {
            let base = request.slot_addr(index);
            desc.for_each_field(|field, bytes| {
                self.channel.copy_out(base + field.offset(), bytes).inspect_err(|fault| {
                    sys_warn!("getprocs: {} of descriptor {} refused: {}", field.name(), index, fault);
                })
            })
        })
    }

    /// The caller's buffer is only touched once, after the walk has
    /// finished and every lock is released.
    #[cfg(feature = "alloc")]
    fn collect_staged(&self, request: &ValidatedRequest) -> Result<usize, CopyFault> {
        let mut staged: Vec<u8> = Vec::with_capacity(request.byte_len());
        let count = self.walk(request.max(), |_, desc| {
            staged.extend_from_slice(&desc.encode());
            Ok(())
        })?;
        debug_assert_eq!(staged.len(), count * DESCRIPTOR_SIZE);
        self.channel.copy_out(request.dst(), &staged).inspect_err(|fault| {
            sys_warn!("getprocs: staged write of {} descriptors refused: {}", count, fault);
        })?;
        Ok(count)
    }

    /// Visit live entries in slot order, at most `max` of them. `emit`
    /// runs with the entry's lock held; its error aborts the walk and every
    /// guard is dropped on the way out.
    fn walk<F>(&self, max: usize, mut emit: F) -> Result<usize, CopyFault>
    where
        F: FnMut(usize, &ProcessDescriptor) -> Result<(), CopyFault>,
    {
        let _links = self.table.lock_table_wide();
        let mut count = 0;

        for slot in 0..self.table.capacity() {
            let Some(entry) = self.table.lock_entry(slot) else {
                break;
            };
            if entry.state.is_live() {
                let ppid = match entry.parent {
                    // A slot never parents itself; don't relock our own entry if it does.
                    Some(parent) if parent == slot => entry.pid,
                    Some(parent) => self.table.lock_entry(parent).map_or(0, |p| p.pid),
                    None => 0,
                };
                let desc = ProcessDescriptor::new(entry.pid, ppid, entry.state, entry.size, &entry.name);
                emit(count, &desc)?;
                count += 1;
            }
            drop(entry);

            if count >= max {
                break;
            }
        }
        Ok(count)
    }
}
