//! Conversion requests built from command-line paths.

use std::path::{Path, PathBuf};

use crate::error::UsageError;
use crate::format::{FileFormat, FormatClass, extension_of};

/// An input file and the output file to produce from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    input_path: PathBuf,
    output_path: PathBuf,
}

impl ConversionRequest {
    /// Create a request from two paths.
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }

    /// Build from positional arguments; exactly two are required.
    pub fn from_args(args: &[PathBuf]) -> Result<Self, UsageError> {
        match args {
            [input, output] => Ok(Self::new(input.clone(), output.clone())),
            _ => Err(UsageError { count: args.len() }),
        }
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Lowercase input extension including the dot.
    pub fn input_extension(&self) -> String {
        extension_of(&self.input_path)
    }

    /// Lowercase output extension including the dot.
    pub fn output_extension(&self) -> String {
        extension_of(&self.output_path)
    }

    pub fn input_class(&self) -> FormatClass {
        FormatClass::of_extension(&self.input_extension())
    }

    pub fn output_class(&self) -> FormatClass {
        FormatClass::of_extension(&self.output_extension())
    }

    pub fn input_format(&self) -> FileFormat {
        FileFormat::from_extension(&self.input_extension())
    }

    pub fn output_format(&self) -> FileFormat {
        FileFormat::from_extension(&self.output_extension())
    }
}
