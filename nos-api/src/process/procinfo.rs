//! Process table snapshot ABI
//!
//! `ProcessDescriptor` is the fixed-layout record the kernel writes into a
//! caller's buffer for every live process. The kernel never blits the
//! struct: each field is written on its own at the offset given by
//! [`DescriptorField::offset`], so the reserved padding word is never filled
//! from kernel memory.

use core::convert::Infallible;
use core::mem::{offset_of, size_of};

use static_assertions::const_assert_eq;

/// Default number of process table slots
pub const NPROC: usize = 64;

/// Length of the process name field
pub const PROC_NAME_LEN: usize = 16;

/// Process lifecycle state as carried on the wire
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcState {
    /// Slot is free
    #[default]
    Unused = 0,
    /// Allocated but not yet scheduled
    Used = 1,
    /// Blocked on a channel
    Sleeping = 2,
    /// Ready to run
    Runnable = 3,
    /// Currently on a CPU
    Running = 4,
    /// Exited, waiting for the parent to reap it
    Zombie = 5,
}

/// Ordinal-to-name table. Index is the wire value of `ProcState`.
pub const STATE_NAMES: [&str; 6] = ["UNUSED", "USED", "SLEEPING", "RUNNABLE", "RUNNING", "ZOMBIE"];

impl ProcState {
    /// All states in ordinal order
    pub const ALL: [ProcState; 6] = [
        ProcState::Unused,
        ProcState::Used,
        ProcState::Sleeping,
        ProcState::Runnable,
        ProcState::Running,
        ProcState::Zombie,
    ];

    /// Decode a wire ordinal
    pub fn from_raw(raw: i32) -> Option<Self> {
        usize::try_from(raw).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Wire ordinal
    pub fn as_raw(self) -> i32 {
        self as i32
    }

    /// Fixed display name
    pub fn name(self) -> &'static str {
        STATE_NAMES[self as usize]
    }

    /// True for every state that occupies a slot
    pub fn is_live(self) -> bool {
        self != ProcState::Unused
    }
}

/// One process as seen by user space
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessDescriptor {
    /// Process ID
    pub pid: i32,
    /// Parent process ID, 0 if none
    pub ppid: i32,
    /// `ProcState` ordinal
    pub state: i32,
    reserved: u32,
    /// Bytes of address space sized for the process
    pub size: u64,
    /// Name, not necessarily NUL-terminated
    pub name: [u8; PROC_NAME_LEN],
}

/// Size of one descriptor in a user buffer
pub const DESCRIPTOR_SIZE: usize = size_of::<ProcessDescriptor>();

const_assert_eq!(offset_of!(ProcessDescriptor, pid), 0);
const_assert_eq!(offset_of!(ProcessDescriptor, ppid), 4);
const_assert_eq!(offset_of!(ProcessDescriptor, state), 8);
const_assert_eq!(offset_of!(ProcessDescriptor, size), 16);
const_assert_eq!(offset_of!(ProcessDescriptor, name), 24);
const_assert_eq!(DESCRIPTOR_SIZE, 40);

/// Individually written descriptor fields, in write order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorField {
    Pid,
    ParentPid,
    State,
    Size,
    Name,
}

impl DescriptorField {
    /// Every field, in the order the kernel writes them
    pub const ALL: [DescriptorField; 5] = [
        DescriptorField::Pid,
        DescriptorField::ParentPid,
        DescriptorField::State,
        DescriptorField::Size,
        DescriptorField::Name,
    ];

    /// Byte offset within a descriptor
    pub const fn offset(self) -> usize {
        match self {
            DescriptorField::Pid => offset_of!(ProcessDescriptor, pid),
            DescriptorField::ParentPid => offset_of!(ProcessDescriptor, ppid),
            DescriptorField::State => offset_of!(ProcessDescriptor, state),
            DescriptorField::Size => offset_of!(ProcessDescriptor, size),
            DescriptorField::Name => offset_of!(ProcessDescriptor, name),
        }
    }

    /// Width in bytes
    pub const fn len(self) -> usize {
        match self {
            DescriptorField::Pid | DescriptorField::ParentPid | DescriptorField::State => {
                size_of::<i32>()
            }
            DescriptorField::Size => size_of::<u64>(),
            DescriptorField::Name => PROC_NAME_LEN,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DescriptorField::Pid => "pid",
            DescriptorField::ParentPid => "ppid",
            DescriptorField::State => "state",
            DescriptorField::Size => "size",
            DescriptorField::Name => "name",
        }
    }
}

impl ProcessDescriptor {
    /// Build a descriptor. `name` is truncated to `PROC_NAME_LEN` bytes.
    pub fn new(pid: i32, ppid: i32, state: ProcState, size: u64, name: &[u8]) -> Self {
        let mut buf = [0u8; PROC_NAME_LEN];
        let len = name.len().min(PROC_NAME_LEN);
        buf[..len].copy_from_slice(&name[..len]);
        Self {
            pid,
            ppid,
            state: state.as_raw(),
            reserved: 0,
            size,
            name: buf,
        }
    }

    /// Decoded state, `None` for an ordinal outside the table
    pub fn state(&self) -> Option<ProcState> {
        ProcState::from_raw(self.state)
    }

    /// Name bytes up to the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(PROC_NAME_LEN);
        &self.name[..end]
    }

    /// Native-endian bytes of one field. Integer fields are staged in `scratch`.
    pub fn field_bytes<'a>(&'a self, field: DescriptorField, scratch: &'a mut [u8; 8]) -> &'a [u8] {
        match field {
            DescriptorField::Pid => {
                scratch[..4].copy_from_slice(&self.pid.to_ne_bytes());
                &scratch[..4]
            }
            DescriptorField::ParentPid => {
                scratch[..4].copy_from_slice(&self.ppid.to_ne_bytes());
                &scratch[..4]
            }
            DescriptorField::State => {
                scratch[..4].copy_from_slice(&self.state.to_ne_bytes());
                &scratch[..4]
            }
            DescriptorField::Size => {
                scratch.copy_from_slice(&self.size.to_ne_bytes());
                &scratch[..]
            }
            DescriptorField::Name => &self.name,
        }
    }

    /// Feed every field to `sink` in write order, stopping at the first error.
    pub fn for_each_field<E, F>(&self, mut sink: F) -> core::result::Result<(), E>
    where
        F: FnMut(DescriptorField, &[u8]) -> core::result::Result<(), E>,
    {
        for field in DescriptorField::ALL {
            let mut scratch = [0u8; 8];
            sink(field, self.field_bytes(field, &mut scratch))?;
        }
        Ok(())
    }

    /// Wire image with the reserved word zeroed
    pub fn encode(&self) -> [u8; DESCRIPTOR_SIZE] {
        let mut out = [0u8; DESCRIPTOR_SIZE];
        let Ok(()) = self.for_each_field::<Infallible, _>(|field, bytes| {
            let start = field.offset();
            out[start..start + bytes.len()].copy_from_slice(bytes);
            Ok(())
        });
        out
    }

    /// Parse one wire image. Returns `None` if `bytes` is too short.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < DESCRIPTOR_SIZE {
            return None;
        }
        let i32_at = |field: DescriptorField| {
            let at = field.offset();
            i32::from_ne_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        let size_at = DescriptorField::Size.offset();
        let mut size = [0u8; 8];
        size.copy_from_slice(&bytes[size_at..size_at + 8]);
        let name_at = DescriptorField::Name.offset();
        let mut name = [0u8; PROC_NAME_LEN];
        name.copy_from_slice(&bytes[name_at..name_at + PROC_NAME_LEN]);

        Some(Self {
            pid: i32_at(DescriptorField::Pid),
            ppid: i32_at(DescriptorField::ParentPid),
            state: i32_at(DescriptorField::State),
            reserved: 0,
            size: u64::from_ne_bytes(size),
            name,
        })
    }
}
