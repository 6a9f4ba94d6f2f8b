//! CLI command handlers.

pub mod collect;
pub mod common;
pub mod config;
pub mod init;
