//! Process information ABI

pub mod procinfo;

// Re-export commonly used items
pub use procinfo::*;
