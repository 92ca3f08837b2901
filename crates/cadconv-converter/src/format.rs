//! File format classification by extension.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Extensions loaded and written as triangulated meshes.
pub const MESH_EXTENSIONS: &[&str] = &[".stl"];

/// Lowercase extension of `path` including the leading dot, or `""`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Whether a file is handled as a mesh or as a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatClass {
    /// Triangulated surface.
    Mesh,
    /// Boundary-representation model.
    Part,
}

impl FormatClass {
    /// Mesh iff the extension is in [`MESH_EXTENSIONS`].
    pub fn of_extension(ext: &str) -> Self {
        if MESH_EXTENSIONS.contains(&ext) {
            Self::Mesh
        } else {
            Self::Part
        }
    }
}

impl fmt::Display for FormatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh => write!(f, "mesh"),
            Self::Part => write!(f, "part"),
        }
    }
}

/// Formats known to the part exporter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// `.stp`
    Step,
    /// `.igs`
    Iges,
    /// `.brp`
    Brep,
    /// `.stl`
    Stl,
    /// Anything else, with the extension as given.
    Unsupported(String),
}

impl FileFormat {
    /// Classify a lowercase extension with leading dot.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".stp" => Self::Step,
            ".igs" => Self::Iges,
            ".brp" => Self::Brep,
            ".stl" => Self::Stl,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Self {
        Self::from_extension(&extension_of(path))
    }

    /// Canonical extension for this format.
    pub fn extension(&self) -> &str {
        match self {
            Self::Step => ".stp",
            Self::Iges => ".igs",
            Self::Brep => ".brp",
            Self::Stl => ".stl",
            Self::Unsupported(ext) => ext,
        }
    }

    /// Formats the kernel's generic shape reader accepts.
    pub fn is_part_input(&self) -> bool {
        matches!(self, Self::Step | Self::Iges | Self::Brep)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step => write!(f, "STEP"),
            Self::Iges => write!(f, "IGES"),
            Self::Brep => write!(f, "BREP"),
            Self::Stl => write!(f, "STL"),
            Self::Unsupported(ext) if ext.is_empty() => write!(f, "(no extension)"),
            Self::Unsupported(ext) => write!(f, "{ext}"),
        }
    }
}
