//! Error handling module for NOS operating system

use core::fmt;

use crate::core::types::KernelError;

/// Common error type used throughout NOS operating system
///
/// Messages are static so the type can be built and carried without a heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Kernel error
    Kernel(KernelError),
    /// Invalid argument
    InvalidArgument(&'static str),
    /// Resource not found
    NotFound(&'static str),
    /// Configuration error
    ConfigError(&'static str),
}

impl Error {
    /// Kernel error code carried by (or implied by) this error
    pub fn kernel_error(&self) -> KernelError {
        match self {
            Error::Kernel(err) => *err,
            Error::InvalidArgument(_) | Error::ConfigError(_) => KernelError::InvalidArgument,
            Error::NotFound(_) => KernelError::NotFound,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Kernel(err) => write!(f, "Kernel error: {}", err),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl From<KernelError> for Error {
    fn from(err: KernelError) -> Self {
        Error::Kernel(err)
    }
}

/// Result type for operations that can fail
pub type Result<T> = core::result::Result<T, Error>;

/// Creates a new invalid argument error
pub fn invalid_argument(msg: &'static str) -> Error {
    Error::InvalidArgument(msg)
}

/// Creates a new not found error
pub fn not_found(msg: &'static str) -> Error {
    Error::NotFound(msg)
}

/// Creates a new config error
pub fn config_error(msg: &'static str) -> Error {
    Error::ConfigError(msg)
}
