//! CLI module for phasegate - inspection commands over config, catalogue, and sagas.

pub mod commands;

pub use commands::Cli;
