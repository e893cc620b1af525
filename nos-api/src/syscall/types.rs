//! System call types

use crate::core::types::KernelError;
use crate::error::Result;

/// System call number
pub type SyscallNumber = u32;

/// System call numbers shared with user space
pub const SYS_WRITE: SyscallNumber = 1;
pub const SYS_EXIT: SyscallNumber = 7;
pub const SYS_GETPROCS: SyscallNumber = 17;

/// Value returned to user space when a system call fails.
///
/// The kernel does not say why; user programs treat any negative return
/// as total failure.
pub const SYSCALL_FAILURE: isize = -1;

/// System call result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallResult {
    /// Success with return value
    Success(isize),
    /// Error with error code
    Error(KernelError),
}

impl SyscallResult {
    /// Returns true if result is success
    pub fn is_success(&self) -> bool {
        matches!(self, SyscallResult::Success(_))
    }

    /// Returns success value if successful
    pub fn success_value(&self) -> Option<isize> {
        match self {
            SyscallResult::Success(value) => Some(*value),
            _ => None,
        }
    }

    /// Register value handed back to user space
    pub fn to_isize(&self) -> isize {
        match self {
            SyscallResult::Success(value) => *value,
            SyscallResult::Error(_) => SYSCALL_FAILURE,
        }
    }
}

impl From<Result<isize>> for SyscallResult {
    fn from(result: Result<isize>) -> Self {
        match result {
            Ok(value) if value >= 0 => SyscallResult::Success(value),
            Ok(value) => SyscallResult::Error(KernelError::Unknown(value as i32)),
            Err(err) => SyscallResult::Error(err.kernel_error()),
        }
    }
}
