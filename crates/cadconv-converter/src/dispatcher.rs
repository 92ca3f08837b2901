//! The conversion dispatcher.
//!
//! Routes a request by the format class of its input and output:
//!
//! | input | output | kernel calls                                             |
//! |-------|--------|----------------------------------------------------------|
//! | mesh  | mesh   | `load_mesh`, `export_mesh`                               |
//! | mesh  | part   | `load_mesh`, `shape_from_mesh(0.01)`, part exporter      |
//! | part  | any    | `read_shape`, part exporter                              |
//!
//! Kernel errors are returned unchanged: no retry and no cleanup of a
//! partially written output.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use cadconv_kernel::{GeometryKernel, MeshHandle, ShapeHandle};
use tracing::{debug, info, instrument};

use crate::TESSELLATION_TOLERANCE;
use crate::error::ConversionError;
use crate::exporter::PartExporter;
use crate::format::{FileFormat, FormatClass};
use crate::report::{ConversionReport, ExportOutcome, ProgressSink, Route, SilentProgress, Stage};
use crate::request::ConversionRequest;

/// Forwards stages to the caller's sink and keeps a copy for the report.
struct StageLog<'a> {
    sink: &'a dyn ProgressSink,
    stages: Mutex<Vec<Stage>>,
}

impl<'a> StageLog<'a> {
    fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            stages: Mutex::new(Vec::new()),
        }
    }

    fn into_stages(self) -> Vec<Stage> {
        self.stages.into_inner().unwrap_or_default()
    }
}

impl ProgressSink for StageLog<'_> {
    fn stage(&self, stage: &Stage) {
        debug!(stage = %stage, "Conversion stage");
        self.sink.stage(stage);
        if let Ok(mut stages) = self.stages.lock() {
            stages.push(stage.clone());
        }
    }
}

/// Dispatches conversions onto a geometry kernel.
pub struct Converter {
    kernel: Arc<dyn GeometryKernel>,
    progress: Arc<dyn ProgressSink>,
}

impl Converter {
    /// Converter that reports no progress.
    pub fn new(kernel: Arc<dyn GeometryKernel>) -> Self {
        Self {
            kernel,
            progress: Arc::new(SilentProgress),
        }
    }

    /// Send progress stages to `progress` as they happen.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// The kernel conversions run on.
    pub fn kernel(&self) -> &dyn GeometryKernel {
        self.kernel.as_ref()
    }

    /// Convert `request.input_path()` into `request.output_path()`.
    #[instrument(
        skip(self, request),
        fields(
            kernel = %self.kernel.name(),
            input = %request.input_path().display(),
            output = %request.output_path().display(),
        )
    )]
    pub async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionReport, ConversionError> {
        let log = StageLog::new(self.progress.as_ref());
        log.stage(&Stage::Direction {
            from: request.input_extension(),
            to: request.output_extension(),
        });

        let input_class = request.input_class();
        let input_format = request.input_format();
        if input_class == FormatClass::Part && !input_format.is_part_input() {
            return Err(ConversionError::UnsupportedInputFormat {
                path: request.input_path().to_path_buf(),
                extension: input_format.extension().to_string(),
            });
        }

        let start = Instant::now();
        let route = match (input_class, request.output_class()) {
            (FormatClass::Mesh, FormatClass::Mesh) => Route::MeshToMesh,
            (FormatClass::Mesh, FormatClass::Part) => Route::MeshToPart,
            (FormatClass::Part, _) => Route::PartToPart,
        };
        info!(?route, "Starting conversion");

        let outcome = match route {
            Route::MeshToMesh => self.mesh_to_mesh(request, &log).await?,
            Route::MeshToPart => self.mesh_to_part(request, &log).await?,
            Route::PartToPart => self.part_to_part(request, &log).await?,
        };

        let elapsed = start.elapsed();
        log.stage(&Stage::Finished { elapsed });
        info!(
            elapsed_ms = elapsed.as_millis() as u64,
            written = outcome == ExportOutcome::Written,
            "Conversion finished"
        );

        Ok(ConversionReport {
            input_path: request.input_path().to_path_buf(),
            output_path: request.output_path().to_path_buf(),
            route,
            outcome,
            stages: log.into_stages(),
            elapsed,
        })
    }

    async fn open_mesh(
        &self,
        path: &Path,
        log: &StageLog<'_>,
    ) -> Result<MeshHandle, ConversionError> {
        log.stage(&Stage::OpeningMesh {
            path: path.to_path_buf(),
        });
        Ok(self.kernel.load_mesh(path).await?)
    }

    async fn mesh_to_mesh(
        &self,
        request: &ConversionRequest,
        log: &StageLog<'_>,
    ) -> Result<ExportOutcome, ConversionError> {
        let mesh = self.open_mesh(request.input_path(), log).await?;

        log.stage(&Stage::ConvertingToMesh {
            path: request.output_path().to_path_buf(),
        });
        let result = self.kernel.export_mesh(&mesh, request.output_path()).await;
        self.kernel.release(mesh.id());

        result?;
        Ok(ExportOutcome::Written)
    }

    async fn mesh_to_part(
        &self,
        request: &ConversionRequest,
        log: &StageLog<'_>,
    ) -> Result<ExportOutcome, ConversionError> {
        let mesh = self.open_mesh(request.input_path(), log).await?;

        log.stage(&Stage::BuildingShape {
            tolerance: TESSELLATION_TOLERANCE,
        });
        let result = match self
            .kernel
            .shape_from_mesh(&mesh, TESSELLATION_TOLERANCE)
            .await
        {
            Ok(shape) => self.export_shape(&shape, request, log).await,
            Err(e) => Err(e.into()),
        };
        self.kernel.release(mesh.id());

        result
    }

    async fn part_to_part(
        &self,
        request: &ConversionRequest,
        log: &StageLog<'_>,
    ) -> Result<ExportOutcome, ConversionError> {
        log.stage(&Stage::OpeningPart {
            path: request.input_path().to_path_buf(),
        });
        let shape = self.kernel.read_shape(request.input_path()).await?;
        self.export_shape(&shape, request, log).await
    }

    /// Run the part exporter, then release the shape.
    async fn export_shape(
        &self,
        shape: &ShapeHandle,
        request: &ConversionRequest,
        log: &StageLog<'_>,
    ) -> Result<ExportOutcome, ConversionError> {
        let format: FileFormat = request.output_format();
        let result = PartExporter::new(self.kernel.as_ref(), log)
            .export(shape, request.output_path(), &format)
            .await;
        self.kernel.release(shape.id());

        Ok(result?)
    }
}
