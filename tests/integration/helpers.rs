//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cadconv_converter::{
    CollectedProgress, ConversionError, ConversionReport, ConversionRequest, Converter,
};
use cadconv_kernel::{GeometryKernel, KernelError, KernelResult, MeshHandle, ShapeHandle};
use tempfile::TempDir;
use uuid::Uuid;

/// A kernel call as seen by [`RecordingKernel`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    LoadMesh(PathBuf),
    ExportMesh(PathBuf),
    ShapeFromMesh(f64),
    ReadShape(PathBuf),
    ExportStep(PathBuf),
    ExportIges(PathBuf),
    ExportBrep(PathBuf),
    ExportStl(PathBuf, f64),
    Release(Uuid),
}

impl Call {
    fn op(&self) -> &'static str {
        match self {
            Call::LoadMesh(_) => "load_mesh",
            Call::ExportMesh(_) => "export_mesh",
            Call::ShapeFromMesh(_) => "shape_from_mesh",
            Call::ReadShape(_) => "read_shape",
            Call::ExportStep(_) => "export_step",
            Call::ExportIges(_) => "export_iges",
            Call::ExportBrep(_) => "export_brep",
            Call::ExportStl(..) => "export_stl",
            Call::Release(_) => "release",
        }
    }
}

/// Kernel that records every call and writes a marker file on export.
///
/// Inputs are not read, so tests do not need real CAD files.
#[derive(Default)]
pub struct RecordingKernel {
    calls: Mutex<Vec<Call>>,
    fail_on: Option<&'static str>,
}

impl RecordingKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kernel whose `op` call fails with a process error.
    pub fn failing_on(op: &'static str) -> Self {
        Self {
            fail_on: Some(op),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Names of the geometry operations, without releases.
    pub fn ops(&self) -> Vec<&'static str> {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, Call::Release(_)))
            .map(Call::op)
            .collect()
    }

    pub fn created_mesh(&self) -> bool {
        self.calls().iter().any(|c| matches!(c, Call::LoadMesh(_)))
    }

    pub fn created_shape(&self) -> bool {
        self.calls()
            .iter()
            .any(|c| matches!(c, Call::ShapeFromMesh(_) | Call::ReadShape(_)))
    }

    pub fn releases(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Release(_)))
            .count()
    }

    fn record(&self, call: Call) -> KernelResult<()> {
        let op = call.op();
        self.calls.lock().expect("calls lock").push(call);
        if self.fail_on == Some(op) {
            return Err(KernelError::ProcessFailed {
                code: 1,
                stderr: format!("{op} failed"),
                stdout: String::new(),
            });
        }
        Ok(())
    }

    fn write_marker(path: &Path, format: &str) -> KernelResult<()> {
        std::fs::write(path, format!("{format} written by RecordingKernel\n"))?;
        Ok(())
    }
}

#[async_trait]
impl GeometryKernel for RecordingKernel {
    fn name(&self) -> &str {
        "recording"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn load_mesh(&self, path: &Path) -> KernelResult<MeshHandle> {
        self.record(Call::LoadMesh(path.to_path_buf()))?;
        Ok(MeshHandle::new(path))
    }

    async fn export_mesh(&self, _mesh: &MeshHandle, path: &Path) -> KernelResult<()> {
        self.record(Call::ExportMesh(path.to_path_buf()))?;
        Self::write_marker(path, "mesh")
    }

    async fn shape_from_mesh(
        &self,
        mesh: &MeshHandle,
        tolerance: f64,
    ) -> KernelResult<ShapeHandle> {
        self.record(Call::ShapeFromMesh(tolerance))?;
        Ok(ShapeHandle::from_mesh(mesh))
    }

    async fn read_shape(&self, path: &Path) -> KernelResult<ShapeHandle> {
        self.record(Call::ReadShape(path.to_path_buf()))?;
        Ok(ShapeHandle::from_file(path))
    }

    async fn export_step(&self, _shape: &ShapeHandle, path: &Path) -> KernelResult<()> {
        self.record(Call::ExportStep(path.to_path_buf()))?;
        Self::write_marker(path, "step")
    }

    async fn export_iges(&self, _shape: &ShapeHandle, path: &Path) -> KernelResult<()> {
        self.record(Call::ExportIges(path.to_path_buf()))?;
        Self::write_marker(path, "iges")
    }

    async fn export_brep(&self, _shape: &ShapeHandle, path: &Path) -> KernelResult<()> {
        self.record(Call::ExportBrep(path.to_path_buf()))?;
        Self::write_marker(path, "brep")
    }

    async fn export_stl(
        &self,
        _shape: &ShapeHandle,
        path: &Path,
        tolerance: f64,
    ) -> KernelResult<()> {
        self.record(Call::ExportStl(path.to_path_buf(), tolerance))?;
        Self::write_marker(path, "stl")
    }

    fn release(&self, id: Uuid) {
        self.calls.lock().expect("calls lock").push(Call::Release(id));
    }
}

/// A converter over a recording kernel, working inside a temp directory.
pub struct TestBench {
    pub dir: TempDir,
    pub kernel: Arc<RecordingKernel>,
    pub progress: Arc<CollectedProgress>,
    pub converter: Converter,
}

impl TestBench {
    pub fn new() -> Self {
        Self::with_kernel(RecordingKernel::new())
    }

    pub fn with_kernel(kernel: RecordingKernel) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let kernel = Arc::new(kernel);
        let progress = Arc::new(CollectedProgress::default());
        let converter = Converter::new(kernel.clone()).with_progress(progress.clone());
        Self {
            dir,
            kernel,
            progress,
            converter,
        }
    }

    /// Absolute path of `name` inside the bench directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub async fn convert(
        &self,
        input: &str,
        output: &str,
    ) -> Result<ConversionReport, ConversionError> {
        let request = ConversionRequest::new(self.path(input), self.path(output));
        self.converter.convert(&request).await
    }
}

/// Minimal ASCII STL: one tetrahedron.
pub const TETRA_STL: &str = "solid tetra
facet normal 0 0 -1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
facet normal 0 -1 0
  outer loop
    vertex 0 0 0
    vertex 0 0 1
    vertex 1 0 0
  endloop
endfacet
facet normal -1 0 0
  outer loop
    vertex 0 0 0
    vertex 0 1 0
    vertex 0 0 1
  endloop
endfacet
facet normal 0.577 0.577 0.577
  outer loop
    vertex 1 0 0
    vertex 0 0 1
    vertex 0 1 0
  endloop
endfacet
endsolid tetra
";
