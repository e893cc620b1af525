//! NOS API - Shared kernel/user ABI types for the NOS operating system
//!
//! This crate holds the types that both sides of the system call boundary
//! must agree on. Anything that crosses from kernel memory into a user
//! address space, or whose numeric value is interpreted by user programs,
//! lives here so there is exactly one definition of it.
//!
//! # Modules
//!
//! - **Core**: Fundamental type aliases and kernel error codes
//! - **Error**: Common error type and result alias
//! - **Syscall**: System call result encoding
//! - **Process**: Process table ABI (`ProcessDescriptor`, `ProcState`)
//!
//! # Usage
//!
//! ```rust
//! use nos_api::process::{ProcessDescriptor, ProcState, DESCRIPTOR_SIZE};
//!
//! let desc = ProcessDescriptor::new(1, 0, ProcState::Running, 4096, b"init");
//! assert_eq!(desc.state(), Some(ProcState::Running));
//! assert_eq!(desc.encode().len(), DESCRIPTOR_SIZE);
//! ```

#![no_std]

pub mod core;
pub mod error;
pub mod syscall;
pub mod process;

// Re-export commonly used types
pub use crate::core::types::*;
pub use crate::error::{Error, Result};
pub use crate::syscall::types::{SyscallResult, SYSCALL_FAILURE};
