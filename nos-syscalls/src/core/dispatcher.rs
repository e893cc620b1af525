//! System call dispatcher
//!
//! This module provides the core system call dispatch mechanism.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;

use nos_api::error::not_found;
use nos_api::{SyscallResult, SYSCALL_FAILURE};
use spin::Mutex;

use super::traits::SyscallHandler;
use crate::{sys_debug, sys_trace};

/// System call dispatcher
pub struct SyscallDispatcher {
    /// Registered system call handlers
    handlers: BTreeMap<u32, Box<dyn SyscallHandler>>,
    /// System call statistics
    stats: Mutex<SyscallStats>,
}

impl SyscallDispatcher {
    /// Create a new system call dispatcher
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
            stats: Mutex::new(SyscallStats::default()),
        }
    }

    /// Register a system call handler, replacing any previous one for `id`
    pub fn register_handler(&mut self, id: u32, handler: Box<dyn SyscallHandler>) {
        sys_trace!("registering syscall {} ({})", id, handler.name());
        self.handlers.insert(id, handler);
    }

    /// Get a system call handler
    pub fn get_handler(&self, id: u32) -> Option<&dyn SyscallHandler> {
        self.handlers.get(&id).map(|h| h.as_ref())
    }

    /// Dispatch a system call
    pub fn dispatch(&self, id: u32, args: &[usize]) -> nos_api::Result<isize> {
        let result = match self.handlers.get(&id) {
            Some(handler) if handler.is_available() => handler.execute(args),
            _ => Err(not_found("system call not registered")),
        };

        let mut stats = self.stats.lock();
        stats.total_calls += 1;
        *stats.calls_by_type.entry(id).or_insert(0) += 1;
        if result.is_err() {
            stats.error_count += 1;
        }

        result
    }

    /// Dispatch and encode the result for the user's return register.
    /// Every failure becomes `SYSCALL_FAILURE`; the reason is only logged.
    pub fn dispatch_raw(&self, id: u32, args: &[usize]) -> isize {
        match self.dispatch(id, args) {
            Ok(value) => SyscallResult::from(Ok(value)).to_isize(),
            Err(err) => {
                sys_debug!("syscall {} failed: {}", id, err);
                SYSCALL_FAILURE
            }
        }
    }

    /// Get system call statistics
    pub fn stats(&self) -> SyscallStats {
        self.stats.lock().clone()
    }
}

impl Default for SyscallDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// System call statistics
#[derive(Debug, Clone, Default)]
pub struct SyscallStats {
    /// Total number of system calls
    pub total_calls: u64,
    /// Number of calls by type
    pub calls_by_type: BTreeMap<u32, u64>,
    /// Number of errors
    pub error_count: u64,
}
