//! getprocs integration tests
//!
//! Drive the call end to end against a real `ProcTable` and a simulated user
//! address space, plus mocked copy channels where the write pattern itself
//! is under test.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use mockall::{mock, Sequence};
use proptest::prelude::*;

use nos_api::process::{DescriptorField, ProcState, ProcessDescriptor, DESCRIPTOR_SIZE, NPROC};
use nos_api::{VirtAddr, PAGE_SIZE, SYSCALL_FAILURE};
use nos_syscalls::process::{
    getprocs, sys_getprocs, CopyFault, CopyFaultKind, CopyOut, GetProcsError, InvalidRequest, ProcTable,
    ProcessTable, UserAddressSpace,
};
use nos_syscalls::{SnapshotConfig, TransferMode};

const BUF: VirtAddr = 0x40_0000;

mock! {
    pub Channel {}

    impl CopyOut for Channel {
        fn copy_out(&self, dst: VirtAddr, src: &[u8]) -> Result<(), CopyFault>;
    }
}

/// `ProcTable` that counts every lock taken through the trait
struct CountingTable {
    inner: ProcTable,
    locks: AtomicUsize,
}

impl CountingTable {
    fn new(inner: ProcTable) -> Self {
        Self { inner, locks: AtomicUsize::new(0) }
    }
}

impl ProcessTable for CountingTable {
    type TableGuard<'a>
        = <ProcTable as ProcessTable>::TableGuard<'a>
    where
        Self: 'a;
    type EntryGuard<'a>
        = <ProcTable as ProcessTable>::EntryGuard<'a>
    where
        Self: 'a;

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn lock_table_wide(&self) -> Self::TableGuard<'_> {
        self.locks.fetch_add(1, Ordering::Relaxed);
        self.inner.lock_table_wide()
    }

    fn lock_entry(&self, slot: usize) -> Option<Self::EntryGuard<'_>> {
        self.locks.fetch_add(1, Ordering::Relaxed);
        self.inner.lock_entry(slot)
    }
}

/// Init running in slot 0 plus `children` sleeping children of init
fn populated_table(capacity: usize, children: &[&[u8]]) -> ProcTable {
    let table = ProcTable::new(capacity);
    let (init, _) = table.alloc(b"init", 4096).unwrap();
    table.set_state(init, ProcState::Running).unwrap();
    for name in children {
        let (slot, _) = table.alloc(name, 8192).unwrap();
        table.set_state(slot, ProcState::Sleeping).unwrap();
        table.set_parent(slot, Some(init)).unwrap();
    }
    table
}

fn user_space(pages: usize) -> UserAddressSpace {
    let space = UserAddressSpace::new(SnapshotConfig::default().max_user_address);
    space.map(BUF, pages * PAGE_SIZE, true).unwrap();
    space
}

fn read_descriptors(space: &UserAddressSpace, at: VirtAddr, count: usize) -> Vec<ProcessDescriptor> {
    (0..count)
        .map(|i| {
            let mut raw = [0u8; DESCRIPTOR_SIZE];
            space.read(at + i * DESCRIPTOR_SIZE, &mut raw).unwrap();
            ProcessDescriptor::decode(&raw).unwrap()
        })
        .collect()
}

#[test]
fn test_single_init_process() {
    let config = SnapshotConfig::default();
    let table = populated_table(NPROC, &[]);
    let space = user_space(1);

    assert_eq!(sys_getprocs(&table, &space, &config, BUF, 10), 1);
    let got = read_descriptors(&space, BUF, 1);
    assert_eq!(got[0], ProcessDescriptor::new(1, 0, ProcState::Running, 4096, b"init"));
}

#[test]
fn test_max_limits_to_first_live_slots() {
    let config = SnapshotConfig::default();
    let table = populated_table(NPROC, &[b"sh", b"cat", b"grep", b"wc"]);
    let space = user_space(1);

    assert_eq!(sys_getprocs(&table, &space, &config, BUF, 2), 2);
    let got = read_descriptors(&space, BUF, 3);
    assert_eq!(got[0].pid, 1);
    assert_eq!(got[1].pid, 2);
    assert_eq!(got[1].ppid, 1);
    assert_eq!(got[1].name_bytes(), b"sh");
    // Nothing past the second slot was written.
    assert_eq!(got[2], ProcessDescriptor::default());
}

#[test]
fn test_unused_slots_are_skipped() {
    let config = SnapshotConfig::default().with_table_capacity(8);
    let table = populated_table(8, &[b"a", b"b", b"c"]);
    table.free(2).unwrap();
    let space = user_space(1);

    assert_eq!(sys_getprocs(&table, &space, &config, BUF, 8), 3);
    let pids: Vec<i32> = read_descriptors(&space, BUF, 3).iter().map(|d| d.pid).collect();
    assert_eq!(pids, vec![1, 2, 4]);
}

#[test]
fn test_parent_of_orphan_is_zero() {
    let config = SnapshotConfig::default().with_table_capacity(8);
    let table = populated_table(8, &[b"sh"]);
    table.free(0).unwrap();
    let space = user_space(1);

    assert_eq!(sys_getprocs(&table, &space, &config, BUF, 8), 1);
    let sh = read_descriptors(&space, BUF, 1)[0];
    assert_eq!(sh.pid, 2);
    assert_eq!(sh.ppid, 0);
}

#[test]
fn test_parent_in_later_slot() {
    let config = SnapshotConfig::default().with_table_capacity(8);
    let table = populated_table(8, &[b"sh", b"cat", b"grep"]);
    // sh (slot 1) now hangs off grep (slot 3), which the walk has yet to visit.
    table.set_parent(1, Some(3)).unwrap();
    let space = user_space(1);

    for mode in [TransferMode::PerField, TransferMode::Staged] {
        let config = config.with_transfer_mode(mode);
        assert_eq!(sys_getprocs(&table, &space, &config, BUF, 8), 4);

        let got = read_descriptors(&space, BUF, 4);
        assert_eq!(got[1].pid, 2);
        assert_eq!(got[1].ppid, 4);
        assert_eq!(got[3].pid, 4);
        assert_eq!(got[3].ppid, 1);
    }

    // Both the child's and the later parent's locks were released.
    assert!(table.set_parent(3, Some(2)).is_ok());
    assert!(table.set_state(1, ProcState::Runnable).is_ok());
}

#[test]
fn test_count_bounded_by_walked_table() {
    // The configuration claims 64 slots; the table only has 8.
    let config = SnapshotConfig::default();
    let table = CountingTable::new(populated_table(8, &[b"a", b"b"]));
    let mut channel = MockChannel::new();
    channel.expect_copy_out().never();

    assert_eq!(sys_getprocs(&table, &channel, &config, BUF, 20), SYSCALL_FAILURE);
    assert_eq!(
        getprocs(&table, &channel, &config, BUF, 20).unwrap_err(),
        GetProcsError::InvalidRequest(InvalidRequest::ExceedsCapacity { requested: 20, capacity: 8 })
    );
    assert_eq!(table.locks.load(Ordering::Relaxed), 0);
}

#[test]
fn test_zero_max_writes_nothing() {
    let config = SnapshotConfig::default();
    let table = populated_table(NPROC, &[b"sh"]);
    let mut channel = MockChannel::new();
    channel.expect_copy_out().never();

    assert_eq!(getprocs(&table, &channel, &config, BUF, 0).unwrap(), 0);
}

#[test]
fn test_rejected_requests_touch_nothing() {
    let config = SnapshotConfig::default();
    let table = CountingTable::new(populated_table(NPROC, &[b"sh"]));
    let mut channel = MockChannel::new();
    channel.expect_copy_out().never();

    let cases = [
        (0, 4),
        (BUF, -1),
        (BUF, NPROC as i32 + 1),
        (usize::MAX - 16, 1),
        (config.max_user_address - DESCRIPTOR_SIZE, 2),
    ];
    for (dst, max) in cases {
        assert_eq!(sys_getprocs(&table, &channel, &config, dst, max), SYSCALL_FAILURE, "dst={dst:#x} max={max}");
    }
    assert_eq!(table.locks.load(Ordering::Relaxed), 0);
}

#[test]
fn test_rejection_reasons() {
    let config = SnapshotConfig::default();
    let table = ProcTable::new(NPROC);
    let space = user_space(1);

    let err = getprocs(&table, &space, &config, 0, 1).unwrap_err();
    assert_eq!(err, GetProcsError::InvalidRequest(InvalidRequest::NullDestination));

    let err = getprocs(&table, &space, &config, BUF, 65).unwrap_err();
    assert_eq!(
        err,
        GetProcsError::InvalidRequest(InvalidRequest::ExceedsCapacity { requested: 65, capacity: NPROC })
    );

    let err = getprocs(&table, &space, &config, usize::MAX - 8, 1).unwrap_err();
    assert_eq!(err, GetProcsError::InvalidRequest(InvalidRequest::AddressOverflow));
}

#[test]
fn test_exactly_capacity_is_accepted() {
    let config = SnapshotConfig::default();
    let table = populated_table(NPROC, &[b"sh"]);
    let space = user_space(1);

    assert_eq!(sys_getprocs(&table, &space, &config, BUF, NPROC as i32), 2);
}

#[test]
fn test_fault_on_last_page_per_field() {
    let config = SnapshotConfig::default();
    let table = populated_table(NPROC, &[b"sh", b"cat", b"grep", b"wc"]);
    let space = user_space(1);
    // Two descriptors fit before the end of the mapped page.
    let dst = BUF + PAGE_SIZE - 2 * DESCRIPTOR_SIZE;

    assert_eq!(sys_getprocs(&table, &space, &config, dst, 5), SYSCALL_FAILURE);

    // Per-field transfer leaves what it managed to write.
    let written = read_descriptors(&space, dst, 2);
    assert_eq!(written[0].pid, 1);
    assert_eq!(written[1].pid, 2);

    // The table is still usable afterwards.
    assert!(table.set_parent(2, Some(1)).is_ok());
}

#[test]
fn test_fault_on_last_page_staged_leaves_buffer_untouched() {
    let config = SnapshotConfig::default().with_transfer_mode(TransferMode::Staged);
    let table = populated_table(NPROC, &[b"sh", b"cat", b"grep", b"wc"]);
    let space = user_space(1);
    let dst = BUF + PAGE_SIZE - 2 * DESCRIPTOR_SIZE;

    let pattern = [0xa5u8; 2 * DESCRIPTOR_SIZE];
    space.copy_out(dst, &pattern).unwrap();

    let err = getprocs(&table, &space, &config, dst, 5).unwrap_err();
    assert_eq!(err, GetProcsError::CopyFault(CopyFault::new(BUF + PAGE_SIZE, CopyFaultKind::Unmapped)));

    let mut after = [0u8; 2 * DESCRIPTOR_SIZE];
    space.read(dst, &mut after).unwrap();
    assert_eq!(after, pattern);
}

#[test]
fn test_read_only_buffer_fails() {
    let config = SnapshotConfig::default();
    let table = populated_table(NPROC, &[]);
    let space = user_space(1);
    space.protect(BUF, PAGE_SIZE, false).unwrap();

    assert_eq!(sys_getprocs(&table, &space, &config, BUF, 1), SYSCALL_FAILURE);
}

#[test]
fn test_consecutive_calls_agree() {
    for mode in [TransferMode::PerField, TransferMode::Staged] {
        let config = SnapshotConfig::default().with_transfer_mode(mode);
        let table = populated_table(NPROC, &[b"sh", b"cat"]);
        let space = user_space(1);

        let first = sys_getprocs(&table, &space, &config, BUF, 64);
        let first_pids: Vec<i32> = read_descriptors(&space, BUF, first as usize).iter().map(|d| d.pid).collect();
        let second = sys_getprocs(&table, &space, &config, BUF, 64);
        let second_pids: Vec<i32> = read_descriptors(&space, BUF, second as usize).iter().map(|d| d.pid).collect();

        assert_eq!(first, 3);
        assert_eq!(first, second);
        assert_eq!(first_pids, second_pids);
    }
}

#[test]
fn test_fields_written_in_order_at_fixed_offsets() {
    let config = SnapshotConfig::default();
    let table = populated_table(NPROC, &[b"sh"]);
    let mut channel = MockChannel::new();
    let mut seq = Sequence::new();

    for index in 0..2 {
        for field in DescriptorField::ALL {
            let at = BUF + index * DESCRIPTOR_SIZE + field.offset();
            channel
                .expect_copy_out()
                .withf(move |dst, src| *dst == at && src.len() == field.len())
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }
    }

    assert_eq!(getprocs(&table, &channel, &config, BUF, 8).unwrap(), 2);
}

#[test]
fn test_first_refused_field_stops_the_walk() {
    let config = SnapshotConfig::default();
    let table = populated_table(NPROC, &[b"sh", b"cat"]);
    let mut channel = MockChannel::new();
    let fault = CopyFault::new(BUF + DescriptorField::State.offset(), CopyFaultKind::ReadOnly);

    channel
        .expect_copy_out()
        .times(3)
        .returning(move |dst, _| if dst == fault.addr { Err(fault) } else { Ok(()) });

    let err = getprocs(&table, &channel, &config, BUF, 8).unwrap_err();
    assert_eq!(err, GetProcsError::CopyFault(fault));
}

#[test]
fn test_staged_mode_issues_one_bulk_write() {
    let config = SnapshotConfig::default().with_transfer_mode(TransferMode::Staged);
    let table = populated_table(NPROC, &[b"sh", b"cat"]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut channel = MockChannel::new();

    let sink = seen.clone();
    channel.expect_copy_out().times(1).returning(move |dst, src| {
        sink.lock().unwrap().push((dst, src.to_vec()));
        Ok(())
    });

    assert_eq!(getprocs(&table, &channel, &config, BUF, 8).unwrap(), 3);
    let seen = seen.lock().unwrap();
    let (dst, bytes) = &seen[0];
    assert_eq!(*dst, BUF);
    assert_eq!(bytes.len(), 3 * DESCRIPTOR_SIZE);
    let cat = ProcessDescriptor::decode(&bytes[2 * DESCRIPTOR_SIZE..]).unwrap();
    assert_eq!(cat.name_bytes(), b"cat");
    assert_eq!(cat.ppid, 1);
}

#[test]
fn test_snapshot_under_churn() {
    const CAPACITY: usize = 16;
    const ROUNDS: usize = 200;

    let config = SnapshotConfig::default().with_table_capacity(CAPACITY);
    let table = Arc::new(populated_table(CAPACITY, &[]));
    let stop = Arc::new(AtomicBool::new(false));

    let workers: Vec<_> = (0..3)
        .map(|worker| {
            let table = table.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut round = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    round += 1;
                    if let Some((slot, _)) = table.alloc(b"worker", (round * 4096) as u64) {
                        let _ = table.set_parent(slot, Some(0));
                        let _ = table.set_state(slot, ProcState::Runnable);
                        let _ = table.resize(slot, 4096);
                        if round % (worker + 2) != 0 {
                            let _ = table.free(slot);
                        }
                    } else {
                        // Table full: free a random-ish non-init slot.
                        let _ = table.free(1 + round % (CAPACITY - 1));
                    }
                }
            })
        })
        .collect();

    let space = user_space(1);
    for _ in 0..ROUNDS {
        for max in [1, 4, CAPACITY as i32] {
            let count = sys_getprocs(&*table, &space, &config, BUF, max);
            assert!(count >= 1, "init is always live");
            assert!(count <= max as isize);

            let got = read_descriptors(&space, BUF, count as usize);
            let mut pids = HashSet::new();
            for desc in &got {
                let state = desc.state().unwrap();
                assert!(state.is_live());
                assert!(pids.insert(desc.pid), "duplicate pid {}", desc.pid);
            }
            assert_eq!(got[0].pid, 1);
        }
    }

    stop.store(true, Ordering::Relaxed);
    for worker in workers {
        worker.join().unwrap();
    }
    assert!(table.live_count() >= 1);
}

proptest! {
    #[test]
    fn prop_validation_matches_bounds(dst in 0usize..(1usize << 39), max in -8i32..80) {
        let config = SnapshotConfig::default();
        let table = ProcTable::new(NPROC);
        let mut channel = MockChannel::new();
        channel.expect_copy_out().never();

        let expect_ok = dst != 0
            && max >= 0
            && (max as usize) <= NPROC
            && dst + max as usize * DESCRIPTOR_SIZE <= config.max_user_address;

        // An empty table never writes, so only validation decides the result.
        let result = getprocs(&table, &channel, &config, dst, max);
        prop_assert_eq!(result.is_ok(), expect_ok);
        if let Ok(count) = result {
            prop_assert_eq!(count, 0);
        }
    }

    #[test]
    fn prop_count_is_min_of_live_and_max(live in 0usize..16, max in 0i32..=16, staged in any::<bool>()) {
        let mode = if staged { TransferMode::Staged } else { TransferMode::PerField };
        let config = SnapshotConfig::default().with_table_capacity(16).with_transfer_mode(mode);
        let table = ProcTable::new(16);
        for _ in 0..live {
            table.alloc(b"p", 4096).unwrap();
        }
        let space = user_space(1);

        let count = getprocs(&table, &space, &config, BUF, max).unwrap();
        prop_assert_eq!(count, live.min(max as usize));

        let got = read_descriptors(&space, BUF, count);
        let pids: HashSet<i32> = got.iter().map(|d| d.pid).collect();
        prop_assert_eq!(pids.len(), count);
        prop_assert!(got.iter().all(|d| d.state() == Some(ProcState::Used)));
    }
}
