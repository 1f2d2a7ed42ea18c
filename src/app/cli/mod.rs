//! Command-line parsing and configuration for the demonstration binary

pub mod args;
pub mod config;

pub use args::Args;
pub use config::{KindSpec, Settings};
