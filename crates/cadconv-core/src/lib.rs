//! # cadconv-core
//!
//! Core crate for cadconv. Contains the unified error system and the
//! configuration schemas shared by the kernel backends and the CLI.
//!
//! This crate has **no** internal dependencies on other cadconv crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
