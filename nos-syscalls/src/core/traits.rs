//! System call traits
//!
//! This module provides common traits for system calls.

use nos_api::Result;

/// System call handler trait
pub trait SyscallHandler: Send + Sync {
    /// Execute the system call with raw register arguments
    fn execute(&self, args: &[usize]) -> Result<isize>;

    /// Get the system call name
    fn name(&self) -> &str;

    /// Get the system call ID
    fn id(&self) -> u32;

    /// Check if the system call is available
    fn is_available(&self) -> bool {
        true
    }
}
