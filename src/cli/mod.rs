//! Command Line Interface (CLI) layer for smapstack.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) dispatching each subcommand to the
//! library's `smapstack::api` entry points.
//!
//! If you are embedding smapstack into another application, use
//! `smapstack::api` directly instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
