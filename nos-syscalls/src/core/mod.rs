//! Core system call functionality
//!
//! This module provides the handler trait and the dispatcher that routes
//! system call numbers to handlers.

pub mod traits;
#[cfg(feature = "alloc")]
pub mod dispatcher;

// Re-export commonly used items
pub use traits::SyscallHandler;
#[cfg(feature = "alloc")]
pub use dispatcher::{SyscallDispatcher, SyscallStats};
