//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and a
//! `run` entry point.
//!
//! - [`serve`] - Run the job dispatcher loop
//! - [`init_data`] - One-shot consistency sweep
//! - [`enqueue`] - Submit a job from a descriptor

pub mod common;
pub mod enqueue;
pub mod init_data;
pub mod serve;
