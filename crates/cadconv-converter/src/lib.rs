//! # cadconv-converter
//!
//! Extension-based dispatch of CAD conversions. A [`ConversionRequest`] is
//! classified into mesh and part formats and routed by the [`Converter`]
//! onto a [`cadconv_kernel::GeometryKernel`]; the [`PartExporter`] owns the
//! table of output formats.

pub mod dispatcher;
pub mod error;
pub mod exporter;
pub mod format;
pub mod report;
pub mod request;

/// Linear deviation used to sew meshes into shapes and to tessellate
/// shapes into STL. Not configurable.
pub const TESSELLATION_TOLERANCE: f64 = 0.01;

pub use dispatcher::Converter;
pub use error::{ConversionError, UsageError};
pub use exporter::PartExporter;
pub use format::{FileFormat, FormatClass, MESH_EXTENSIONS};
pub use report::{
    CollectedProgress, ConversionReport, ExportOutcome, ProgressSink, Route, SilentProgress, Stage,
};
pub use request::ConversionRequest;
