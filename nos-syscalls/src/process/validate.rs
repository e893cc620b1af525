//! `getprocs` request validation
//!
//! Runs before the process table is touched. A request that passes yields a
//! [`ValidatedRequest`], the only form of input the snapshot collector
//! accepts, so an unchecked destination cannot reach a copy.

use core::fmt;

use nos_api::VirtAddr;
use nos_api::process::DESCRIPTOR_SIZE;

use crate::config::SnapshotConfig;

/// Reason a request was refused. Only ever logged; user space sees -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRequest {
    NullDestination,
    NegativeCount(i32),
    ExceedsCapacity { requested: i32, capacity: usize },
    AddressOverflow,
    BeyondUserSpace { end: VirtAddr },
}

impl InvalidRequest {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidRequest::NullDestination => "null destination",
            InvalidRequest::NegativeCount(_) => "negative count",
            InvalidRequest::ExceedsCapacity { .. } => "count exceeds table capacity",
            InvalidRequest::AddressOverflow => "destination range overflows",
            InvalidRequest::BeyondUserSpace { .. } => "destination range leaves user space",
        }
    }
}

impl fmt::Display for InvalidRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidRequest::NegativeCount(n) => write!(f, "{} ({})", self.as_str(), n),
            InvalidRequest::ExceedsCapacity { requested, capacity } => {
                write!(f, "{} ({} > {})", self.as_str(), requested, capacity)
            }
            InvalidRequest::BeyondUserSpace { end } => write!(f, "{} (end {:#x})", self.as_str(), end),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// A destination range that is non-null, in user space, and sized for at
/// most one descriptor per slot of the table being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedRequest {
    dst: VirtAddr,
    max: usize,
}

impl ValidatedRequest {
    /// Start of the caller's buffer
    pub fn dst(&self) -> VirtAddr {
        self.dst
    }

    /// Most descriptors the caller has room for
    pub fn max(&self) -> usize {
        self.max
    }

    /// Total bytes the caller reserved
    pub fn byte_len(&self) -> usize {
        self.max * DESCRIPTOR_SIZE
    }

    /// Address of descriptor `index`. `index < max`, so this stays inside
    /// the validated range.
    pub fn slot_addr(&self, index: usize) -> VirtAddr {
        debug_assert!(index < self.max);
        self.dst + index * DESCRIPTOR_SIZE
    }
}

/// Check a raw `(dst, max)` pair. `capacity` is the slot count of the
/// table the snapshot will walk; `config` bounds the user range.
pub fn validate_request(
    dst: VirtAddr,
    max: i32,
    capacity: usize,
    config: &SnapshotConfig,
) -> Result<ValidatedRequest, InvalidRequest> {
    if dst == 0 {
        return Err(InvalidRequest::NullDestination);
    }
    let count = usize::try_from(max).map_err(|_| InvalidRequest::NegativeCount(max))?;
    if count > capacity {
        return Err(InvalidRequest::ExceedsCapacity { requested: max, capacity });
    }
    let end = count
        .checked_mul(DESCRIPTOR_SIZE)
        .and_then(|len| dst.checked_add(len))
        .ok_or(InvalidRequest::AddressOverflow)?;
    if end > config.max_user_address {
        return Err(InvalidRequest::BeyondUserSpace { end });
    }
    Ok(ValidatedRequest { dst, max: count })
}
