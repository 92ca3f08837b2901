//! Geometry kernel configuration.
//!
//! The tessellation tolerance used for mesh/shape conversion is not part of
//! this schema: it is fixed at `0.01` by the converter.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Which kernel backend performs the geometry work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelBackend {
    /// An external FreeCAD installation driven through `freecadcmd`.
    #[default]
    Freecad,
    /// The built-in pure Rust backend (STL only).
    Native,
}

impl fmt::Display for KernelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Freecad => write!(f, "freecad"),
            Self::Native => write!(f, "native"),
        }
    }
}

impl FromStr for KernelBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "freecad" => Ok(Self::Freecad),
            "native" => Ok(Self::Native),
            other => Err(format!(
                "unknown kernel backend '{other}' (expected 'freecad' or 'native')"
            )),
        }
    }
}

/// Configuration for the geometry kernel.
///
/// If `freecad_path` is empty the FreeCAD backend auto-discovers an
/// installation (common install directories, then `PATH`).
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Backend selection.
    pub backend: KernelBackend,

    /// Path to `freecadcmd` or to a FreeCAD installation directory.
    ///
    /// Empty means auto-discovery.
    pub freecad_path: PathBuf,

    /// Timeout in seconds for a single kernel process invocation.
    #[validate(range(min = 1, max = 7200))]
    pub timeout_seconds: u64,

    /// Whether to capture kernel stdout/stderr for diagnostics.
    pub capture_output: bool,

    /// Keep generated kernel scripts on disk after the run.
    pub keep_scripts: bool,

    /// Root directory for per-run scratch directories.
    pub scratch_root: Option<PathBuf>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            backend: KernelBackend::default(),
            freecad_path: PathBuf::new(),
            timeout_seconds: default_timeout_seconds(),
            capture_output: true,
            keep_scripts: false,
            scratch_root: None,
        }
    }
}

fn default_timeout_seconds() -> u64 {
    600
}

impl KernelConfig {
    /// Resolve the effective scratch root directory.
    pub fn effective_scratch_root(&self) -> PathBuf {
        match &self.scratch_root {
            Some(root) if !root.as_os_str().is_empty() => root.clone(),
            _ => std::env::temp_dir().join("cadconv"),
        }
    }

    /// Whether a FreeCAD path was configured explicitly.
    pub fn has_explicit_freecad_path(&self) -> bool {
        !self.freecad_path.as_os_str().is_empty()
    }
}
