//! FreeCAD backend.
//!
//! FreeCAD is driven through its console executable. Loading a mesh or
//! reading a shape only records the Python statements that recreate the
//! object; nothing runs until an export, when the recorded statements plus
//! the export statement are written to a scratch script and executed in a
//! single `freecadcmd` process.

pub mod discovery;
pub mod executor;
pub mod script;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use cadconv_core::config::KernelConfig;
use tracing::{debug, info, warn};
use uuid::Uuid;

use self::discovery::{FreecadDiscovery, FreecadInstallation};
use self::executor::{ScriptRunner, validate_output};
use self::script::{KernelScript, Statement, mesh_var, python_path, shape_var};
use crate::error::{KernelError, KernelResult};
use crate::traits::{GeometryKernel, MeshHandle, ShapeHandle};

/// Per-run scratch directory for generated scripts.
///
/// Removed on drop unless scripts are kept for debugging.
#[derive(Debug)]
struct ScratchDir {
    path: PathBuf,
    keep: bool,
}

impl ScratchDir {
    fn create(root: &Path, keep: bool) -> KernelResult<Self> {
        let path = root.join(Uuid::now_v7().simple().to_string());
        std::fs::create_dir_all(&path)?;
        Ok(Self { path, keep })
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.keep {
            info!(dir = %self.path.display(), "Keeping FreeCAD scripts");
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(dir = %self.path.display(), error = %e, "Failed to clean up scratch directory");
        }
    }
}

/// Geometry kernel backed by an external FreeCAD installation.
#[derive(Debug)]
pub struct FreecadKernel {
    installation: FreecadInstallation,
    runner: ScriptRunner,
    scratch: ScratchDir,
    /// Statements that recreate each live handle.
    lineage: Mutex<HashMap<Uuid, Vec<Statement>>>,
}

impl FreecadKernel {
    /// Discover FreeCAD according to `config` and set up a scratch directory.
    pub fn from_config(config: &KernelConfig) -> KernelResult<Self> {
        let explicit = config
            .has_explicit_freecad_path()
            .then_some(config.freecad_path.as_path());
        let installation = FreecadDiscovery::resolve(explicit)?;
        Self::new(installation, config)
    }

    /// Use an already discovered installation.
    pub fn new(installation: FreecadInstallation, config: &KernelConfig) -> KernelResult<Self> {
        let scratch = ScratchDir::create(&config.effective_scratch_root(), config.keep_scripts)?;
        let runner = ScriptRunner::new(
            installation.executable.clone(),
            config.timeout_seconds,
            config.capture_output,
        );

        info!(installation = %installation.summary(), "FreeCAD kernel ready");
        Ok(Self {
            installation,
            runner,
            scratch,
            lineage: Mutex::new(HashMap::new()),
        })
    }

    /// The installation in use.
    pub fn installation(&self) -> &FreecadInstallation {
        &self.installation
    }

    fn lineage(&self) -> MutexGuard<'_, HashMap<Uuid, Vec<Statement>>> {
        self.lineage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn statements_for(&self, id: Uuid) -> KernelResult<Vec<Statement>> {
        self.lineage()
            .get(&id)
            .cloned()
            .ok_or(KernelError::HandleNotFound { id })
    }

    fn record(&self, id: Uuid, statements: Vec<Statement>) {
        self.lineage().insert(id, statements);
    }

    /// Run the handle's statements followed by `export`, then check `output`.
    async fn run_export(&self, id: Uuid, export: Statement, output: &Path) -> KernelResult<()> {
        let mut statements = self.statements_for(id)?;
        statements.push(export);

        let script_path = KernelScript::new(statements)
            .write_to(&self.scratch.path)
            .await?;
        debug!(script = %script_path.display(), output = %output.display(), "Running export");

        self.runner.run(&script_path).await?;
        let bytes = validate_output(output)?;
        info!(output = %output.display(), bytes, "Export written");
        Ok(())
    }

    fn shape_export(
        &self,
        shape: &ShapeHandle,
        path: &Path,
        build: fn(String, String) -> Statement,
    ) -> KernelResult<Statement> {
        Ok(build(shape_var(shape.id()), python_path(path)?))
    }
}

fn require_input(path: &Path) -> KernelResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(KernelError::InputNotFound {
            path: path.to_path_buf(),
        })
    }
}

#[async_trait]
impl GeometryKernel for FreecadKernel {
    fn name(&self) -> &str {
        "freecad"
    }

    fn is_available(&self) -> bool {
        self.runner.executable().is_file()
    }

    async fn load_mesh(&self, path: &Path) -> KernelResult<MeshHandle> {
        require_input(path)?;
        let handle = MeshHandle::new(path);
        let open = Statement::OpenMesh {
            var: mesh_var(handle.id()),
            path: python_path(path)?,
        };
        self.record(handle.id(), vec![open]);
        Ok(handle)
    }

    async fn export_mesh(&self, mesh: &MeshHandle, path: &Path) -> KernelResult<()> {
        let write = Statement::WriteMesh {
            var: mesh_var(mesh.id()),
            path: python_path(path)?,
        };
        self.run_export(mesh.id(), write, path).await
    }

    async fn shape_from_mesh(
        &self,
        mesh: &MeshHandle,
        tolerance: f64,
    ) -> KernelResult<ShapeHandle> {
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Err(KernelError::InvalidArgument(format!(
                "tolerance must be positive, got {tolerance}"
            )));
        }

        let mut statements = self.statements_for(mesh.id())?;
        let shape = ShapeHandle::from_mesh(mesh);
        statements.push(Statement::ShapeFromMesh {
            var: shape_var(shape.id()),
            mesh_var: mesh_var(mesh.id()),
            tolerance,
        });
        self.record(shape.id(), statements);
        Ok(shape)
    }

    async fn read_shape(&self, path: &Path) -> KernelResult<ShapeHandle> {
        require_input(path)?;
        let shape = ShapeHandle::from_file(path);
        let read = Statement::ReadShape {
            var: shape_var(shape.id()),
            path: python_path(path)?,
        };
        self.record(shape.id(), vec![read]);
        Ok(shape)
    }

    async fn export_step(&self, shape: &ShapeHandle, path: &Path) -> KernelResult<()> {
        let stmt = self.shape_export(shape, path, |var, path| Statement::ExportStep { var, path })?;
        self.run_export(shape.id(), stmt, path).await
    }

    async fn export_iges(&self, shape: &ShapeHandle, path: &Path) -> KernelResult<()> {
        let stmt = self.shape_export(shape, path, |var, path| Statement::ExportIges { var, path })?;
        self.run_export(shape.id(), stmt, path).await
    }

    async fn export_brep(&self, shape: &ShapeHandle, path: &Path) -> KernelResult<()> {
        let stmt = self.shape_export(shape, path, |var, path| Statement::ExportBrep { var, path })?;
        self.run_export(shape.id(), stmt, path).await
    }

    async fn export_stl(
        &self,
        shape: &ShapeHandle,
        path: &Path,
        tolerance: f64,
    ) -> KernelResult<()> {
        let stmt = Statement::ExportStl {
            var: shape_var(shape.id()),
            path: python_path(path)?,
            tolerance,
        };
        self.run_export(shape.id(), stmt, path).await
    }

    fn release(&self, id: Uuid) {
        self.lineage().remove(&id);
    }
}
