//! Core types used throughout NOS operating system

use core::fmt;

/// Process identifier type, as seen by user space
pub type Pid = i32;

/// Virtual address type
pub type VirtAddr = usize;

/// Page size shared by the kernel and user space
pub const PAGE_SIZE: usize = 4096;

/// Represents a kernel error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// No such file or directory
    NotFound,
    /// Invalid argument
    InvalidArgument,
    /// Bad address in a user buffer
    BadAddress,
    /// Unknown error
    Unknown(i32),
}

impl KernelError {
    /// POSIX-style errno value for this error
    pub fn errno(&self) -> i32 {
        match self {
            KernelError::NotFound => 2,
            KernelError::BadAddress => 14,
            KernelError::InvalidArgument => 22,
            KernelError::Unknown(code) => *code,
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::NotFound => write!(f, "No such file or directory"),
            KernelError::InvalidArgument => write!(f, "Invalid argument"),
            KernelError::BadAddress => write!(f, "Bad address"),
            KernelError::Unknown(code) => write!(f, "Unknown error: {}", code),
        }
    }
}
