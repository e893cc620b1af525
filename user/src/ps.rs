//! `ps` output formatting
//!
//! Kept apart from the binary so the table layout can be checked on the host.

use core::fmt::{self, Write};

use nos_api::process::{NPROC, ProcessDescriptor, STATE_NAMES};

/// Column header; every column but the last is left-aligned to a fixed width
pub const HEADER: &str = "PID    PPID   STATE      SIZE       NAME";

/// Printed alone when the kernel refuses the request
pub const FAILURE_LINE: &str = "getprocs error";

const PID_WIDTH: usize = 7;
const PPID_WIDTH: usize = 7;
const STATE_WIDTH: usize = 11;
const SIZE_WIDTH: usize = 11;

/// Name for a state ordinal, `???` if it is not one
pub fn state_name(raw: i32) -> &'static str {
    usize::try_from(raw)
        .ok()
        .and_then(|index| STATE_NAMES.get(index))
        .copied()
        .unwrap_or("???")
}

/// Leading decimal digits of `arg` as an int; anything else reads as 0.
/// No argument means the whole table.
pub fn parse_max(arg: Option<&[u8]>) -> i32 {
    let Some(arg) = arg else {
        return NPROC as i32;
    };
    arg.iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0i32, |n, b| n.wrapping_mul(10).wrapping_add((b - b'0') as i32))
}

fn write_name<W: Write>(out: &mut W, name: &[u8]) -> fmt::Result {
    for chunk in name.utf8_chunks() {
        out.write_str(chunk.valid())?;
        if !chunk.invalid().is_empty() {
            out.write_char(char::REPLACEMENT_CHARACTER)?;
        }
    }
    Ok(())
}

/// One table row
pub fn write_row<W: Write>(out: &mut W, desc: &ProcessDescriptor) -> fmt::Result {
    write!(
        out,
        "{:<pw$}{:<ppw$}{:<sw$}{:<zw$}",
        desc.pid,
        desc.ppid,
        state_name(desc.state),
        desc.size,
        pw = PID_WIDTH,
        ppw = PPID_WIDTH,
        sw = STATE_WIDTH,
        zw = SIZE_WIDTH,
    )?;
    write_name(out, desc.name_bytes())?;
    out.write_char('\n')
}

/// Render the result of a `getprocs` call: the failure line for a negative
/// `result`, otherwise the header and the first `result` descriptors.
pub fn render<W: Write>(out: &mut W, result: isize, descs: &[ProcessDescriptor]) -> fmt::Result {
    let Ok(count) = usize::try_from(result) else {
        return writeln!(out, "{}", FAILURE_LINE);
    };
    writeln!(out, "{}", HEADER)?;
    for desc in descs.iter().take(count) {
        write_row(out, desc)?;
    }
    Ok(())
}
