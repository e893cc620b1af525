//! Process system calls
//!
//! `getprocs(dst, max)` copies one `ProcessDescriptor` per live process
//! into the caller's buffer and returns how many it wrote, or -1.
//!
//! The call is split the way the kernel is: `validate` checks the
//! destination before anything else happens, `snapshot` walks the table
//! under the documented lock order, and `table` / `copyout` are the
//! scheduler and memory-manager interfaces it consumes.

pub mod copyout;
pub mod error;
pub mod snapshot;
pub mod table;
pub mod validate;
#[cfg(feature = "alloc")]
pub mod address_space;

#[cfg(feature = "alloc")]
use alloc::boxed::Box;
#[cfg(feature = "alloc")]
use alloc::sync::Arc;

use nos_api::{SYSCALL_FAILURE, VirtAddr};

use crate::config::SnapshotConfig;
use crate::sys_debug;

pub use copyout::{CopyFault, CopyFaultKind, CopyOut};
pub use error::GetProcsError;
pub use snapshot::SnapshotCollector;
pub use table::{ProcEntry, ProcessTable};
pub use validate::{InvalidRequest, ValidatedRequest, validate_request};
#[cfg(feature = "alloc")]
pub use address_space::UserAddressSpace;
#[cfg(feature = "alloc")]
pub use table::ProcTable;

#[cfg(feature = "alloc")]
use nos_api::error::config_error;

#[cfg(feature = "alloc")]
use crate::core::{SyscallDispatcher, SyscallHandler};
#[cfg(feature = "alloc")]
use crate::types::{GETPROCS_ARGC, SYS_GETPROCS};

/// Validate the request, then snapshot `table` into `caller`'s memory.
///
/// The count is bounded by `table.capacity()`, the table actually walked,
/// whatever `config.table_capacity` says.
pub fn getprocs<T, C>(
    table: &T,
    caller: &C,
    config: &SnapshotConfig,
    dst: VirtAddr,
    max: i32,
) -> Result<usize, GetProcsError>
where
    T: ProcessTable + ?Sized,
    C: CopyOut + ?Sized,
{
    let request = validate_request(dst, max, table.capacity(), config)?;
    let count = SnapshotCollector::new(table, caller, config.transfer_mode).collect(&request)?;
    Ok(count)
}

/// Syscall boundary: the count, or `SYSCALL_FAILURE` for any error.
pub fn sys_getprocs<T, C>(table: &T, caller: &C, config: &SnapshotConfig, dst: VirtAddr, max: i32) -> isize
where
    T: ProcessTable + ?Sized,
    C: CopyOut + ?Sized,
{
    match getprocs(table, caller, config, dst, max) {
        Ok(count) => count as isize,
        Err(err) => {
            sys_debug!("{}", err);
            SYSCALL_FAILURE
        }
    }
}

/// Register process system call handlers
#[cfg(feature = "alloc")]
pub fn register_handlers<T, C>(
    dispatcher: &mut SyscallDispatcher,
    table: Arc<T>,
    caller: Arc<C>,
    config: SnapshotConfig,
) -> nos_api::Result<()>
where
    T: ProcessTable + Send + Sync + 'static,
    C: CopyOut + Send + Sync + 'static,
{
    config.validate()?;
    if table.capacity() != config.table_capacity {
        return Err(config_error("table capacity does not match the configuration"));
    }
    dispatcher.register_handler(SYS_GETPROCS, Box::new(GetProcsHandler::new(table, caller, config)));
    Ok(())
}

/// `getprocs` handler bound to one table and the calling address space
#[cfg(feature = "alloc")]
pub struct GetProcsHandler<T, C> {
    table: Arc<T>,
    caller: Arc<C>,
    config: SnapshotConfig,
}

#[cfg(feature = "alloc")]
impl<T, C> GetProcsHandler<T, C> {
    pub fn new(table: Arc<T>, caller: Arc<C>, config: SnapshotConfig) -> Self {
        Self { table, caller, config }
    }
}

#[cfg(feature = "alloc")]
impl<T, C> SyscallHandler for GetProcsHandler<T, C>
where
    T: ProcessTable + Send + Sync,
    C: CopyOut + Send + Sync,
{
    fn execute(&self, args: &[usize]) -> nos_api::Result<isize> {
        if args.len() < GETPROCS_ARGC {
            return Err(nos_api::error::invalid_argument("Insufficient arguments"));
        }
        let dst = args[0];
        // The count register is read as a C int: only the low 32 bits count.
        let max = args[1] as i32;

        let count = getprocs(&*self.table, &*self.caller, &self.config, dst, max)?;
        Ok(count as isize)
    }

    fn name(&self) -> &str {
        "getprocs"
    }

    fn id(&self) -> u32 {
        SYS_GETPROCS
    }
}
