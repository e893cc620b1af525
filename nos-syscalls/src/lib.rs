//! NOS System Calls
//!
//! This crate provides the system call interface and dispatch mechanism for
//! the NOS operating system, together with the process table introspection
//! call `getprocs`.
//!
//! # Architecture
//!
//! - **Core**: handler trait and dispatcher
//! - **Process**: `getprocs` request validation, table snapshot, and the
//!   process table / user copy interfaces it consumes
//! - **Config**: build-time values for the snapshot (table capacity, user
//!   address limit, transfer mode)
//!
//! # Usage
//!
//! ```rust
//! use nos_syscalls::config::SnapshotConfig;
//! use nos_syscalls::process::{sys_getprocs, ProcTable, UserAddressSpace};
//!
//! let config = SnapshotConfig::default();
//! let table = ProcTable::new(config.table_capacity);
//! table.alloc(b"init", 4096);
//!
//! let caller = UserAddressSpace::new(config.max_user_address);
//! caller.map(0x4000, 4096, true).unwrap();
//!
//! assert_eq!(sys_getprocs(&table, &caller, &config, 0x4000, 64), 1);
//! assert_eq!(sys_getprocs(&table, &caller, &config, 0, 64), -1);
//! ```

#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod logging;
pub mod core;
pub mod config;
pub mod process;
pub mod types;

// Re-export commonly used items
pub use crate::core::SyscallHandler;
#[cfg(feature = "alloc")]
pub use crate::core::{SyscallDispatcher, SyscallStats};
pub use config::{SnapshotConfig, TransferMode};
pub use process::{GetProcsError, getprocs, sys_getprocs};
pub use types::*;
