//! System call type definitions
//!
//! Numbers are owned by `nos-api` so user space links against the same
//! values the dispatcher registers.

pub use nos_api::syscall::types::{SyscallNumber, SYS_EXIT, SYS_GETPROCS, SYS_WRITE};

/// Arguments decoded for `SYS_GETPROCS`
pub const GETPROCS_ARGC: usize = 2;
