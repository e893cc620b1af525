//! Process table
//!
//! `ProcessTable` is the view the snapshot code gets of the scheduler's
//! table: a fixed number of slots, each behind its own lock, plus one
//! table-wide lock that serializes parent/child link changes.
//!
//! Lock order, for every path: table-wide lock, then one entry lock, then
//! (only while reading a parent's pid) the parent's entry lock. Paths that
//! do not hold the table-wide lock never hold more than one entry lock.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;
use core::ops::Deref;
#[cfg(feature = "alloc")]
use core::sync::atomic::{AtomicI32, Ordering};

#[cfg(feature = "alloc")]
use spin::{Mutex, MutexGuard};

#[cfg(feature = "alloc")]
use nos_api::error::{invalid_argument, not_found};
use nos_api::process::{PROC_NAME_LEN, ProcState};
use nos_api::Pid;
#[cfg(feature = "alloc")]
use nos_api::Result;

/// One process control entry, as much of it as introspection sees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcEntry {
    pub pid: Pid,
    pub state: ProcState,
    /// Slot index of the parent process
    pub parent: Option<usize>,
    /// Bytes of user address space
    pub size: u64,
    pub name: [u8; PROC_NAME_LEN],
}

impl ProcEntry {
    pub fn set_name(&mut self, name: &[u8]) {
        let len = name.len().min(PROC_NAME_LEN);
        self.name = [0; PROC_NAME_LEN];
        self.name[..len].copy_from_slice(&name[..len]);
    }
}

/// Locked access to a process table
pub trait ProcessTable {
    /// Held while parent links must not change
    type TableGuard<'a>
    where
        Self: 'a;
    /// Held while one entry's fields must not change
    type EntryGuard<'a>: Deref<Target = ProcEntry>
    where
        Self: 'a;

    /// Number of slots
    fn capacity(&self) -> usize;

    /// Acquire the table-wide lock
    fn lock_table_wide(&self) -> Self::TableGuard<'_>;

    /// Acquire one slot's lock, `None` if `slot` is out of range
    fn lock_entry(&self, slot: usize) -> Option<Self::EntryGuard<'_>>;
}

/// Slot-array process table
#[cfg(feature = "alloc")]
pub struct ProcTable {
    wait_lock: Mutex<()>,
    slots: Vec<Mutex<ProcEntry>>,
    next_pid: AtomicI32,
}

#[cfg(feature = "alloc")]
impl ProcTable {
    /// Table with `capacity` unused slots
    pub fn new(capacity: usize) -> Self {
        Self {
            wait_lock: Mutex::new(()),
            slots: (0..capacity).map(|_| Mutex::new(ProcEntry::default())).collect(),
            next_pid: AtomicI32::new(1),
        }
    }

    fn slot(&self, slot: usize) -> Result<&Mutex<ProcEntry>> {
        self.slots.get(slot).ok_or_else(|| not_found("no such process slot"))
    }

    fn live_slot(&self, slot: usize) -> Result<MutexGuard<'_, ProcEntry>> {
        let entry = self.slot(slot)?.lock();
        if !entry.state.is_live() {
            return Err(not_found("process slot is unused"));
        }
        Ok(entry)
    }

    /// Claim the first unused slot. Returns the slot and the new pid.
    pub fn alloc(&self, name: &[u8], size: u64) -> Option<(usize, Pid)> {
        for (slot, cell) in self.slots.iter().enumerate() {
            let mut entry = cell.lock();
            if entry.state == ProcState::Unused {
                let pid = self.next_pid.fetch_add(1, Ordering::Relaxed);
                *entry = ProcEntry {
                    pid,
                    state: ProcState::Used,
                    parent: None,
                    size,
                    name: [0; PROC_NAME_LEN],
                };
                entry.set_name(name);
                return Some((slot, pid));
            }
        }
        None
    }

    pub fn set_state(&self, slot: usize, state: ProcState) -> Result<()> {
        if !state.is_live() {
            return Err(invalid_argument("use free() to release a slot"));
        }
        self.live_slot(slot)?.state = state;
        Ok(())
    }

    pub fn resize(&self, slot: usize, size: u64) -> Result<()> {
        self.live_slot(slot)?.size = size;
        Ok(())
    }

    pub fn set_name(&self, slot: usize, name: &[u8]) -> Result<()> {
        self.live_slot(slot)?.set_name(name);
        Ok(())
    }

    /// Link `slot` to `parent` (or clear the link). Runs under the
    /// table-wide lock.
    pub fn set_parent(&self, slot: usize, parent: Option<usize>) -> Result<()> {
        let _links = self.wait_lock.lock();
        if let Some(parent) = parent {
            if parent == slot {
                return Err(invalid_argument("a process cannot parent itself"));
            }
            drop(self.live_slot(parent)?);
        }
        self.live_slot(slot)?.parent = parent;
        Ok(())
    }

    /// Release `slot`. Children are handed to the process in slot 0 (init),
    /// or orphaned if the freed slot is init itself.
    pub fn free(&self, slot: usize) -> Result<()> {
        let _links = self.wait_lock.lock();
        drop(self.live_slot(slot)?);

        let heir = if slot == 0 { None } else { Some(0) };
        for (other, cell) in self.slots.iter().enumerate() {
            if other == slot {
                continue;
            }
            let mut entry = cell.lock();
            if entry.parent == Some(slot) {
                entry.parent = heir;
            }
        }

        *self.slot(slot)?.lock() = ProcEntry::default();
        Ok(())
    }

    /// Number of slots in a live state right now
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|cell| cell.lock().state.is_live()).count()
    }

    /// Copy of one entry
    pub fn entry(&self, slot: usize) -> Option<ProcEntry> {
        self.slots.get(slot).map(|cell| *cell.lock())
    }
}

#[cfg(feature = "alloc")]
impl ProcessTable for ProcTable {
    type TableGuard<'a> = MutexGuard<'a, ()>;
    type EntryGuard<'a> = MutexGuard<'a, ProcEntry>;

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn lock_table_wide(&self) -> Self::TableGuard<'_> {
        self.wait_lock.lock()
    }

    fn lock_entry(&self, slot: usize) -> Option<Self::EntryGuard<'_>> {
        self.slots.get(slot).map(|cell| cell.lock())
    }
}
