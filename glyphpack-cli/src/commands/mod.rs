//! CLI subcommands.

pub mod build;
pub mod cache;
pub mod common;
pub mod config;
