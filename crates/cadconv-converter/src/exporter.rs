//! Export of a shape according to the output format.

use std::path::Path;

use cadconv_kernel::{GeometryKernel, KernelResult, ShapeHandle};
use tracing::{info, warn};

use crate::TESSELLATION_TOLERANCE;
use crate::format::FileFormat;
use crate::report::{ExportOutcome, ProgressSink, Stage};

/// Writes a shape through the kernel's exporter for each known format.
pub struct PartExporter<'a> {
    kernel: &'a dyn GeometryKernel,
    progress: &'a dyn ProgressSink,
}

impl<'a> PartExporter<'a> {
    pub fn new(kernel: &'a dyn GeometryKernel, progress: &'a dyn ProgressSink) -> Self {
        Self { kernel, progress }
    }

    /// Export `shape` to `output_path` as `format`.
    ///
    /// An unsupported format is reported and skipped without touching the
    /// filesystem; it is not an error.
    pub async fn export(
        &self,
        shape: &ShapeHandle,
        output_path: &Path,
        format: &FileFormat,
    ) -> KernelResult<ExportOutcome> {
        let part_stage = || Stage::ExportingPart {
            path: output_path.to_path_buf(),
        };

        match format {
            FileFormat::Step => {
                self.progress.stage(&part_stage());
                self.kernel.export_step(shape, output_path).await?;
            }
            FileFormat::Iges => {
                self.progress.stage(&part_stage());
                self.kernel.export_iges(shape, output_path).await?;
            }
            FileFormat::Brep => {
                self.progress.stage(&part_stage());
                self.kernel.export_brep(shape, output_path).await?;
            }
            FileFormat::Stl => {
                self.progress.stage(&Stage::ExportingMesh {
                    path: output_path.to_path_buf(),
                });
                self.kernel
                    .export_stl(shape, output_path, TESSELLATION_TOLERANCE)
                    .await?;
            }
            FileFormat::Unsupported(extension) => {
                warn!(extension = %extension, "Output format not supported, nothing written");
                self.progress.stage(&Stage::Unsupported {
                    extension: extension.clone(),
                });
                return Ok(ExportOutcome::Unsupported {
                    extension: extension.clone(),
                });
            }
        }

        info!(format = %format, output = %output_path.display(), "Shape exported");
        Ok(ExportOutcome::Written)
    }
}
