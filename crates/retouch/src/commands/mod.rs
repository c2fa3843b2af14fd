//! Subcommand implementations.

pub mod compress;
pub mod decompress;
pub mod process;
