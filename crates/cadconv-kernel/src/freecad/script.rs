//! FreeCAD Python script generation.
//!
//! Each kernel handle owns the statements that recreate it. An export
//! concatenates the handle's statements with one export statement and
//! runs the result as a standalone script in `freecadcmd`.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::{KernelError, KernelResult};

/// Quote a path as a Python string literal with forward slashes.
pub fn python_path(path: &Path) -> KernelResult<String> {
    let raw = path.to_str().ok_or_else(|| KernelError::InvalidUtf8Path {
        path: path.to_path_buf(),
    })?;
    let escaped = raw.replace('\\', "/").replace('"', "\\\"");
    Ok(format!("\"{escaped}\""))
}

/// Python variable holding the mesh with this id.
pub fn mesh_var(id: Uuid) -> String {
    format!("mesh_{}", id.simple())
}

/// Python variable holding the shape with this id.
pub fn shape_var(id: Uuid) -> String {
    format!("shape_{}", id.simple())
}

/// One FreeCAD operation, rendered as Python.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `mesh = Mesh.Mesh(path)`
    OpenMesh { var: String, path: String },
    /// `mesh.write(path)`
    WriteMesh { var: String, path: String },
    /// Sew a mesh's topology into a new shape.
    ShapeFromMesh {
        var: String,
        mesh_var: String,
        tolerance: f64,
    },
    /// Read a STEP/IGES/BREP file into a new shape.
    ReadShape { var: String, path: String },
    /// `shape.exportStep(path)`
    ExportStep { var: String, path: String },
    /// `shape.exportIges(path)`
    ExportIges { var: String, path: String },
    /// `shape.exportBrep(path)`
    ExportBrep { var: String, path: String },
    /// `shape.exportStl(path, tolerance)`
    ExportStl {
        var: String,
        path: String,
        tolerance: f64,
    },
}

impl Statement {
    /// Render as Python source lines (without indentation).
    pub fn render(&self) -> Vec<String> {
        match self {
            Self::OpenMesh { var, path } => vec![format!("{var} = Mesh.Mesh({path})")],
            Self::WriteMesh { var, path } => vec![format!("{var}.write({path})")],
            Self::ShapeFromMesh {
                var,
                mesh_var,
                tolerance,
            } => vec![
                format!("{var} = Part.Shape()"),
                format!("{var}.makeShapeFromMesh({mesh_var}.Topology, {tolerance})"),
            ],
            Self::ReadShape { var, path } => vec![
                format!("{var} = Part.Shape()"),
                format!("{var}.read({path})"),
            ],
            Self::ExportStep { var, path } => vec![format!("{var}.exportStep({path})")],
            Self::ExportIges { var, path } => vec![format!("{var}.exportIges({path})")],
            Self::ExportBrep { var, path } => vec![format!("{var}.exportBrep({path})")],
            Self::ExportStl {
                var,
                path,
                tolerance,
            } => vec![format!("{var}.exportStl({path}, {tolerance})")],
        }
    }
}

/// A complete script: imports, statements, and an error trap that turns a
/// Python exception into a non-zero exit status.
#[derive(Debug, Clone, Default)]
pub struct KernelScript {
    statements: Vec<Statement>,
}

impl KernelScript {
    /// Script running the given statements in order.
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    /// Render the full script source.
    pub fn render(&self) -> String {
        let mut out = String::from("import os\nimport sys\nimport Mesh\nimport Part\n\ntry:\n");
        for line in self.statements.iter().flat_map(Statement::render) {
            out.push_str("    ");
            out.push_str(&line);
            out.push('\n');
        }
        if self.statements.is_empty() {
            out.push_str("    pass\n");
        }
        out.push_str(
            "except Exception as exc:\n    \
             sys.stderr.write(\"cadconv: %s\\n\" % exc)\n    \
             sys.stderr.flush()\n    \
             os._exit(1)\n",
        );
        out
    }

    /// Write the script into `dir` under a unique name.
    pub async fn write_to(&self, dir: &Path) -> KernelResult<PathBuf> {
        let path = dir.join(format!("convert__{}.py", Uuid::now_v7().simple()));

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(self.render().as_bytes()).await?;
        file.flush().await?;

        Ok(path)
    }
}
