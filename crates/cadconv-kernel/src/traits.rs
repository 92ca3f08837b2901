//! Kernel abstraction traits.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{KernelError, KernelResult};

/// Opaque reference to a triangulated mesh held by a kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshHandle {
    id: Uuid,
    source: PathBuf,
}

impl MeshHandle {
    /// Create a handle for a mesh loaded from `source`.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
        }
    }

    /// Kernel-side identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// File the mesh was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Where a shape came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeOrigin {
    /// Read directly from a part file.
    File(PathBuf),
    /// Built from the mesh with this id.
    Mesh(Uuid),
}

/// Opaque reference to a boundary-representation shape held by a kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeHandle {
    id: Uuid,
    origin: ShapeOrigin,
}

impl ShapeHandle {
    /// Create a handle for a shape read from a part file.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin: ShapeOrigin::File(path.into()),
        }
    }

    /// Create a handle for a shape built from a mesh.
    pub fn from_mesh(mesh: &MeshHandle) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin: ShapeOrigin::Mesh(mesh.id()),
        }
    }

    /// Kernel-side identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Origin of the shape.
    pub fn origin(&self) -> &ShapeOrigin {
        &self.origin
    }
}

/// Geometry kernel operations needed by the converter.
///
/// Every operation names the object it acts on through a handle; there is
/// no implicit "current document". A kernel may keep state per handle
/// until [`GeometryKernel::release`] is called.
#[async_trait]
pub trait GeometryKernel: Send + Sync {
    /// Backend name used in logs and messages.
    fn name(&self) -> &str;

    /// Whether the backend can do work at all.
    fn is_available(&self) -> bool;

    /// Load a triangulated mesh file.
    async fn load_mesh(&self, path: &Path) -> KernelResult<MeshHandle>;

    /// Write a mesh to `path`, format chosen from the extension.
    async fn export_mesh(&self, mesh: &MeshHandle, path: &Path) -> KernelResult<()>;

    /// Build a faceted shape from a mesh, sewing within `tolerance`.
    async fn shape_from_mesh(&self, mesh: &MeshHandle, tolerance: f64)
    -> KernelResult<ShapeHandle>;

    /// Read a STEP, IGES or BREP file into a shape.
    async fn read_shape(&self, path: &Path) -> KernelResult<ShapeHandle>;

    /// Export a shape as STEP.
    async fn export_step(&self, shape: &ShapeHandle, path: &Path) -> KernelResult<()>;

    /// Export a shape as IGES.
    async fn export_iges(&self, shape: &ShapeHandle, path: &Path) -> KernelResult<()>;

    /// Export a shape as BREP.
    async fn export_brep(&self, shape: &ShapeHandle, path: &Path) -> KernelResult<()>;

    /// Tessellate a shape and export it as STL.
    async fn export_stl(&self, shape: &ShapeHandle, path: &Path, tolerance: f64)
    -> KernelResult<()>;

    /// Drop kernel-side state for a handle id.
    fn release(&self, _id: Uuid) {}
}

/// Kernel that refuses every operation.
///
/// Used when no backend could be set up, so that callers still get a
/// descriptive error instead of a panic.
pub struct NullKernel {
    reason: String,
}

impl NullKernel {
    /// Create a null kernel carrying the reason the real one is missing.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable<T>(&self) -> KernelResult<T> {
        Err(KernelError::NotAvailable {
            reason: self.reason.clone(),
        })
    }
}

#[async_trait]
impl GeometryKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn load_mesh(&self, _path: &Path) -> KernelResult<MeshHandle> {
        self.unavailable()
    }

    async fn export_mesh(&self, _mesh: &MeshHandle, _path: &Path) -> KernelResult<()> {
        self.unavailable()
    }

    async fn shape_from_mesh(
        &self,
        _mesh: &MeshHandle,
        _tolerance: f64,
    ) -> KernelResult<ShapeHandle> {
        self.unavailable()
    }

    async fn read_shape(&self, _path: &Path) -> KernelResult<ShapeHandle> {
        self.unavailable()
    }

    async fn export_step(&self, _shape: &ShapeHandle, _path: &Path) -> KernelResult<()> {
        self.unavailable()
    }

    async fn export_iges(&self, _shape: &ShapeHandle, _path: &Path) -> KernelResult<()> {
        self.unavailable()
    }

    async fn export_brep(&self, _shape: &ShapeHandle, _path: &Path) -> KernelResult<()> {
        self.unavailable()
    }

    async fn export_stl(
        &self,
        _shape: &ShapeHandle,
        _path: &Path,
        _tolerance: f64,
    ) -> KernelResult<()> {
        self.unavailable()
    }
}
