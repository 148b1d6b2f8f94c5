//! github-dl - re-runnable GitHub repository archiver
//!
//! This crate provides the core functionality for the `github-dl` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Run configuration and endpoint resolution
//! - [`github`] - Rate-limited REST client and pagination
//! - [`store`] - On-disk snapshot layout and idempotent writes
//! - [`sync`] - Incremental planning and the per-repository sequence
//! - [`mirror`] - Git mirror clone and fetch
//! - [`validate`] - Owner, repository and file name checks
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod mirror;
pub mod store;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};
