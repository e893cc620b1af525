//! `getprocs` failure taxonomy

use core::fmt;

use nos_api::{Error, KernelError};

use super::copyout::CopyFault;
use super::validate::InvalidRequest;

/// Why a `getprocs` call failed. Both variants reach user space as -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetProcsError {
    /// Refused before the table was touched
    InvalidRequest(InvalidRequest),
    /// A descriptor write was refused mid-walk
    CopyFault(CopyFault),
}

impl fmt::Display for GetProcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GetProcsError::InvalidRequest(reason) => write!(f, "getprocs: invalid request: {}", reason),
            GetProcsError::CopyFault(fault) => write!(f, "getprocs: {}", fault),
        }
    }
}

impl From<InvalidRequest> for GetProcsError {
    fn from(reason: InvalidRequest) -> Self {
        GetProcsError::InvalidRequest(reason)
    }
}

impl From<CopyFault> for GetProcsError {
    fn from(fault: CopyFault) -> Self {
        GetProcsError::CopyFault(fault)
    }
}

impl From<GetProcsError> for Error {
    fn from(err: GetProcsError) -> Self {
        match err {
            GetProcsError::InvalidRequest(reason) => Error::InvalidArgument(reason.as_str()),
            GetProcsError::CopyFault(_) => Error::Kernel(KernelError::BadAddress),
        }
    }
}
