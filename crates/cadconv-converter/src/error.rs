//! Converter error types.

use std::path::PathBuf;

use cadconv_core::error::AppError;
use cadconv_kernel::KernelError;
use thiserror::Error;

/// Wrong number of positional file arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected an input file and an output file, got {count} argument(s)")]
pub struct UsageError {
    /// How many positional arguments were given.
    pub count: usize,
}

/// Errors from a conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// A non-mesh input whose extension no part reader handles.
    #[error("Unsupported input format '{extension}' for {path} (expected .stl, .stp, .igs or .brp)")]
    UnsupportedInputFormat {
        /// The input file.
        path: PathBuf,
        /// Its lowercase extension, possibly empty.
        extension: String,
    },

    /// Failure reported by the geometry kernel.
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

impl From<UsageError> for AppError {
    fn from(err: UsageError) -> Self {
        AppError::usage(err.to_string())
    }
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        match err {
            ConversionError::UnsupportedInputFormat { .. } => {
                AppError::unsupported_format(err.to_string())
            }
            ConversionError::Kernel(e) => e.into(),
        }
    }
}
