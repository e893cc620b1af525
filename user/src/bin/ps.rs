//! ps - list live processes

#![no_std]
#![no_main]

use nos_api::process::{NPROC, ProcessDescriptor};
use user::ps::{parse_max, render};
use user::*;

#[unsafe(no_mangle)]
pub extern "C" fn _start(argc: usize, argv: *const *const u8) -> ! {
    let arg = if argc > 1 {
        // SAFETY: the kernel hands us `argc` valid NUL-terminated strings.
        Some(unsafe { cstr_bytes(*argv.add(1)) })
    } else {
        None
    };

    let mut procs = [ProcessDescriptor::default(); NPROC];
    let result = getprocs(&mut procs, parse_max(arg));

    if render(&mut Stdout, result, &procs).is_err() {
        exit(1);
    }
    exit(0);
}
