//! Unified error type for geometry kernel operations.
//!
//! Backend failures (installation discovery, process execution, mesh I/O)
//! are consolidated into a single `KernelError` enum that maps cleanly to
//! `cadconv_core::AppError`.

use cadconv_core::error::{AppError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::freecad::discovery::DiscoveryError;

/// Unified error type for all kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    // --- Availability ---
    /// No usable kernel backend.
    #[error("Geometry kernel not available: {reason}")]
    NotAvailable {
        /// Why the kernel cannot be used.
        reason: String,
    },

    /// FreeCAD installation discovery failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The backend does not implement this operation.
    #[error("{kernel} kernel does not support {operation}")]
    Unsupported {
        /// Backend name.
        kernel: String,
        /// Operation that was requested.
        operation: String,
    },

    // --- Inputs and handles ---
    /// The input file does not exist.
    #[error("Input file not found: {path}")]
    InputNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A handle was used after release or with the wrong kernel.
    #[error("Unknown kernel handle: {id}")]
    HandleNotFound {
        /// The id that was looked up.
        id: Uuid,
    },

    /// An argument was rejected before reaching the geometry code.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A mesh file could not be parsed.
    #[error("Failed to read mesh {path}: {reason}")]
    MeshRead {
        /// The mesh file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A mesh has no triangles to work with.
    #[error("Mesh contains no usable triangles: {path}")]
    EmptyMesh {
        /// The mesh file the handle was loaded from.
        path: PathBuf,
    },

    // --- Process execution ---
    /// Kernel process timed out.
    #[error("Kernel process timed out after {timeout_seconds}s")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout_seconds: u64,
    },

    /// Kernel process exited with a non-zero status.
    #[error("Kernel process exited with code {code}: {stderr}")]
    ProcessFailed {
        /// The exit code.
        code: i32,
        /// Captured stderr output.
        stderr: String,
        /// Captured stdout output.
        stdout: String,
    },

    /// Kernel process was terminated by a signal.
    #[error("Kernel process was killed (signal termination)")]
    ProcessKilled,

    /// Output file was not created by an otherwise successful export.
    #[error("Output file not created: {path}")]
    OutputNotCreated {
        /// Expected output path.
        path: PathBuf,
    },

    /// Output file is empty (0 bytes).
    #[error("Output file is empty (0 bytes): {path}")]
    OutputEmpty {
        /// Path to the empty output file.
        path: PathBuf,
    },

    // --- Generic ---
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A path could not be embedded in a kernel script.
    #[error("Path is not valid UTF-8: {path}")]
    InvalidUtf8Path {
        /// The offending path.
        path: PathBuf,
    },
}

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    /// Shorthand for an unsupported-operation error.
    pub fn unsupported(kernel: &str, operation: &str) -> Self {
        Self::Unsupported {
            kernel: kernel.to_string(),
            operation: operation.to_string(),
        }
    }
}

impl From<KernelError> for AppError {
    fn from(err: KernelError) -> Self {
        match &err {
            KernelError::Discovery(_) | KernelError::NotAvailable { .. } => {
                AppError::configuration(err.to_string())
            }
            KernelError::InputNotFound { .. } | KernelError::Io(_) => {
                AppError::new(ErrorKind::Io, err.to_string())
            }
            KernelError::Unsupported { .. } => {
                AppError::unsupported_format(err.to_string())
            }
            _ => AppError::kernel(err.to_string()),
        }
    }
}
