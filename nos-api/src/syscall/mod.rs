//! System call ABI

pub mod types;

pub use types::*;
