//! Conversion progress and the final report.

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

/// Which conversion path the dispatcher took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Mesh loaded and written back as a mesh.
    MeshToMesh,
    /// Mesh loaded, sewn into a shape, exported through the part table.
    MeshToPart,
    /// Shape read from a part file, exported through the part table.
    PartToPart,
}

/// Result of the part exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ExportOutcome {
    /// The output file was written.
    Written,
    /// The output extension is not in the export table; nothing was written.
    Unsupported { extension: String },
}

/// One user-visible step of a conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum Stage {
    Direction { from: String, to: String },
    OpeningMesh { path: PathBuf },
    ConvertingToMesh { path: PathBuf },
    BuildingShape { tolerance: f64 },
    OpeningPart { path: PathBuf },
    ExportingPart { path: PathBuf },
    ExportingMesh { path: PathBuf },
    Unsupported { extension: String },
    Finished { elapsed: Duration },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direction { from, to } => write!(f, "{from} -> {to}"),
            Self::OpeningMesh { path } => write!(f, "Mesh file: {}", path.display()),
            Self::ConvertingToMesh { path } => {
                write!(f, "Converting to a mesh file: {}", path.display())
            }
            Self::BuildingShape { tolerance } => {
                write!(f, "Building a shape from the mesh (tolerance {tolerance})")
            }
            Self::OpeningPart { path } => write!(f, "Opening a part file: {}", path.display()),
            Self::ExportingPart { path } => write!(f, "Exporting to part file: {}", path.display()),
            Self::ExportingMesh { path } => {
                write!(f, "Exporting to a mesh file: {}", path.display())
            }
            Self::Unsupported { extension } => {
                write!(f, "Exporting to {extension} is not supported.")
            }
            Self::Finished { elapsed } => write!(
                f,
                "Converted the CAD model in {:.10} seconds",
                elapsed.as_secs_f64()
            ),
        }
    }
}

/// Receives stages as they happen.
pub trait ProgressSink: Send + Sync {
    fn stage(&self, stage: &Stage);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn stage(&self, _stage: &Stage) {}
}

/// Keeps every stage in memory.
#[derive(Debug, Default)]
pub struct CollectedProgress {
    stages: Mutex<Vec<Stage>>,
}

impl CollectedProgress {
    /// Stages received so far.
    pub fn stages(&self) -> Vec<Stage> {
        self.stages
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Rendered progress lines received so far.
    pub fn lines(&self) -> Vec<String> {
        self.stages().iter().map(ToString::to_string).collect()
    }
}

impl ProgressSink for CollectedProgress {
    fn stage(&self, stage: &Stage) {
        if let Ok(mut stages) = self.stages.lock() {
            stages.push(stage.clone());
        }
    }
}

/// Summary of one finished conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub route: Route,
    pub outcome: ExportOutcome,
    /// Every stage in order, including the final timing.
    pub stages: Vec<Stage>,
    pub elapsed: Duration,
}

impl ConversionReport {
    /// Whether an output file was produced.
    pub fn wrote_output(&self) -> bool {
        self.outcome == ExportOutcome::Written
    }
}
