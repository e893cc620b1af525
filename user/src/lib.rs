//! User-space library for NOS
//! Provides syscall wrappers, console output, and the `ps` renderer

#![cfg_attr(not(test), no_std)]

use core::arch::asm;
use core::fmt;

use nos_api::process::{NPROC, ProcessDescriptor};
use nos_api::syscall::{SYS_EXIT, SYS_GETPROCS, SYS_WRITE};

pub mod ps;

// ============================================================================
// Low-level syscall interface
// ============================================================================

#[cfg(target_arch = "riscv64")]
#[inline(always)]
pub fn syscall1(num: usize, arg0: usize) -> isize {
    let ret: isize;
    unsafe {
        asm!(
            "ecall",
            inlateout("a0") arg0 => ret,
            in("a7") num,
        );
    }
    ret
}

#[cfg(target_arch = "riscv64")]
#[inline(always)]
pub fn syscall2(num: usize, arg0: usize, arg1: usize) -> isize {
    let ret: isize;
    unsafe {
        asm!(
            "ecall",
            inlateout("a0") arg0 => ret,
            in("a1") arg1,
            in("a7") num,
        );
    }
    ret
}

#[cfg(target_arch = "riscv64")]
#[inline(always)]
pub fn syscall3(num: usize, arg0: usize, arg1: usize, arg2: usize) -> isize {
    let ret: isize;
    unsafe {
        asm!(
            "ecall",
            inlateout("a0") arg0 => ret,
            in("a1") arg1,
            in("a2") arg2,
            in("a7") num,
        );
    }
    ret
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub fn syscall1(num: usize, arg0: usize) -> isize {
    let ret: isize;
    unsafe {
        asm!(
            "svc #0",
            inlateout("x0") arg0 => ret,
            in("x8") num,
        );
    }
    ret
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub fn syscall2(num: usize, arg0: usize, arg1: usize) -> isize {
    let ret: isize;
    unsafe {
        asm!(
            "svc #0",
            inlateout("x0") arg0 => ret,
            in("x1") arg1,
            in("x8") num,
        );
    }
    ret
}

#[cfg(target_arch = "aarch64")]
#[inline(always)]
pub fn syscall3(num: usize, arg0: usize, arg1: usize, arg2: usize) -> isize {
    let ret: isize;
    unsafe {
        asm!(
            "svc #0",
            inlateout("x0") arg0 => ret,
            in("x1") arg1,
            in("x2") arg2,
            in("x8") num,
        );
    }
    ret
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn syscall1(num: usize, arg0: usize) -> isize {
    let ret: isize;
    unsafe {
        asm!(
            "syscall",
            inlateout("rax") num => ret,
            in("rdi") arg0,
            out("rcx") _,
            out("r11") _,
        );
    }
    ret
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn syscall2(num: usize, arg0: usize, arg1: usize) -> isize {
    let ret: isize;
    unsafe {
        asm!(
            "syscall",
            inlateout("rax") num => ret,
            in("rdi") arg0,
            in("rsi") arg1,
            out("rcx") _,
            out("r11") _,
        );
    }
    ret
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn syscall3(num: usize, arg0: usize, arg1: usize, arg2: usize) -> isize {
    let ret: isize;
    unsafe {
        asm!(
            "syscall",
            inlateout("rax") num => ret,
            in("rdi") arg0,
            in("rsi") arg1,
            in("rdx") arg2,
            out("rcx") _,
            out("r11") _,
        );
    }
    ret
}

// ============================================================================
// System call wrappers
// ============================================================================

/// Exit the current process
pub fn exit(status: i32) -> ! {
    syscall1(SYS_EXIT as usize, status as usize);
    unreachable!()
}

/// Write to file descriptor
pub fn write(fd: i32, buf: &[u8]) -> isize {
    syscall3(SYS_WRITE as usize, fd as usize, buf.as_ptr() as usize, buf.len())
}

/// Fill `buf` with up to `max` live processes. Returns the count, or a
/// negative value if the kernel refused the request.
///
/// The kernel never writes more than `NPROC` descriptors, so a table-sized
/// buffer is always large enough for any `max` it accepts.
pub fn getprocs(buf: &mut [ProcessDescriptor; NPROC], max: i32) -> isize {
    // Sign-extended; the kernel reads the low 32 bits back as an int.
    syscall2(SYS_GETPROCS as usize, buf.as_mut_ptr() as usize, max as isize as usize)
}

// ============================================================================
// Console output
// ============================================================================

pub const STDOUT: i32 = 1;

/// Write a string to stdout
pub fn puts(s: &str) {
    write(STDOUT, s.as_bytes());
}

/// `fmt::Write` sink over stdout
pub struct Stdout;

impl fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if write(STDOUT, s.as_bytes()) < 0 {
            return Err(fmt::Error);
        }
        Ok(())
    }
}

/// Bytes of a NUL-terminated string, without the terminator
///
/// # Safety
/// `s` must point to a readable, NUL-terminated byte string that outlives `'a`.
pub unsafe fn cstr_bytes<'a>(s: *const u8) -> &'a [u8] {
    let mut len = 0;
    unsafe {
        while *s.add(len) != 0 {
            len += 1;
        }
        core::slice::from_raw_parts(s, len)
    }
}

// ============================================================================
// Panic handler for user space
// ============================================================================

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    puts("user panic!\n");
    exit(1);
}
