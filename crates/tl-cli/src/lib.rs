//! Table linker command line: argument parsing, logging setup and command
//! orchestration for the `tl` binary.

pub mod cli;
pub mod commands;
pub mod logging;
