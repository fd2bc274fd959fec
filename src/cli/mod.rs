//! Command-line interface definition.

mod commands;

pub use commands::{Cli, OutputFormat};
