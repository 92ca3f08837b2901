//! FreeCAD installation discovery and validation.
//!
//! Locates the console binary (`freecadcmd` / `FreeCADCmd.exe`) by checking:
//! 1. An explicitly configured path (file or install directory)
//! 2. Common installation directories for the current platform
//! 3. The system PATH

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Console executable names, most likely first.
#[cfg(windows)]
const EXECUTABLE_NAMES: &[&str] = &["FreeCADCmd.exe", "freecadcmd.exe"];
#[cfg(not(windows))]
const EXECUTABLE_NAMES: &[&str] = &["freecadcmd", "FreeCADCmd"];

/// Directory levels searched below a configured path: enough for
/// `<dir>/FreeCAD 0.21/bin/freecadcmd`.
const SEARCH_DEPTH: usize = 2;

/// Errors from FreeCAD discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No installation was found anywhere.
    #[error("FreeCAD installation not found. Searched: {searched}")]
    NotFound {
        /// Summary of the locations that were searched.
        searched: String,
    },

    /// A directory was found but holds no console executable.
    #[error("FreeCAD directory {install_dir} does not contain {executable}")]
    ExecutableMissing {
        /// The directory that was inspected.
        install_dir: PathBuf,
        /// The expected executable name.
        executable: String,
    },

    /// The executable exists but cannot be used.
    #[error("FreeCAD executable {path} is unusable: {reason}")]
    Unusable {
        /// The executable path.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
}

/// How the FreeCAD installation was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Explicitly configured by the user.
    ExplicitConfig,
    /// Found in a common installation directory.
    CommonPath,
    /// Found via the system PATH environment variable.
    SystemPath,
}

/// A discovered FreeCAD installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreecadInstallation {
    /// Full path to the console executable.
    pub executable: PathBuf,
    /// Directory holding the executable.
    pub install_dir: PathBuf,
    /// Version parsed from a `FreeCAD <version>` directory name, if any.
    pub version: Option<String>,
    /// How the installation was discovered.
    pub discovery_method: DiscoveryMethod,
}

impl FreecadInstallation {
    fn new(executable: PathBuf, method: DiscoveryMethod) -> Self {
        let install_dir = executable
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let version = version_from_path(&executable);
        Self {
            executable,
            install_dir,
            version,
            discovery_method: method,
        }
    }

    /// One-line description for `--kernel-info` output and logs.
    pub fn summary(&self) -> String {
        let version = self.version.as_deref().unwrap_or("unknown version");
        format!(
            "{} ({}, found via {:?})",
            self.executable.display(),
            version,
            self.discovery_method
        )
    }
}

/// Extract `0.18` from paths like `C:/Program Files/FreeCAD 0.18/bin/FreeCADCmd.exe`.
fn version_from_path(path: &Path) -> Option<String> {
    path.ancestors()
        .filter_map(|p| p.file_name()?.to_str())
        .find_map(|name| {
            let rest = name.strip_prefix("FreeCAD")?.trim_start_matches([' ', '-', '_']);
            let first = rest.chars().next()?;
            first.is_ascii_digit().then(|| rest.to_string())
        })
}

/// FreeCAD installation discovery engine.
pub struct FreecadDiscovery;

impl FreecadDiscovery {
    /// Resolve an installation, preferring `explicit` when it is usable.
    ///
    /// An explicit path that does not hold FreeCAD is logged and discovery
    /// falls back to the automatic search.
    pub fn resolve(explicit: Option<&Path>) -> Result<FreecadInstallation, DiscoveryError> {
        if let Some(path) = explicit {
            match Self::from_explicit_path(path).and_then(|i| Self::validate(&i).map(|()| i)) {
                Ok(installation) => return Ok(installation),
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "Configured FreeCAD path is unusable, falling back to discovery"
                ),
            }
        }

        let installation = Self::discover()?;
        Self::validate(&installation)?;
        Ok(installation)
    }

    /// Search common directories, then PATH.
    pub fn discover() -> Result<FreecadInstallation, DiscoveryError> {
        info!("Searching for FreeCAD installation...");

        if let Some(installation) = Self::discover_from_common_paths() {
            info!(
                path = %installation.executable.display(),
                version = ?installation.version,
                "Found FreeCAD in common installation path"
            );
            return Ok(installation);
        }
        debug!("Common path discovery failed, trying PATH");

        if let Some(installation) = Self::discover_from_path() {
            info!(path = %installation.executable.display(), "Found FreeCAD in system PATH");
            return Ok(installation);
        }
        debug!("PATH discovery failed");

        Err(DiscoveryError::NotFound {
            searched: "common install directories and PATH".to_string(),
        })
    }

    /// Candidate directories that may contain the console executable.
    pub fn common_install_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        #[cfg(windows)]
        {
            for var in ["ProgramFiles", "ProgramFiles(x86)"] {
                if let Ok(root) = std::env::var(var) {
                    paths.extend(Self::versioned_dirs(Path::new(&root)));
                }
            }
            paths.push(PathBuf::from("C:/Program Files/FreeCAD 0.18/bin"));
        }

        #[cfg(not(windows))]
        {
            paths.push(PathBuf::from("/usr/bin"));
            paths.push(PathBuf::from("/usr/local/bin"));
            paths.push(PathBuf::from("/usr/lib/freecad/bin"));
            paths.push(PathBuf::from("/usr/lib/freecad-python3/bin"));
            paths.push(PathBuf::from("/snap/bin"));
            paths.push(PathBuf::from(
                "/Applications/FreeCAD.app/Contents/Resources/bin",
            ));
        }

        paths
    }

    /// `FreeCAD*/bin` directories under `root`, newest name first.
    #[cfg_attr(not(windows), allow(dead_code))]
    fn versioned_dirs(root: &Path) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(root) else {
            return Vec::new();
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("FreeCAD"))
            .map(|e| e.path().join("bin"))
            .collect();
        dirs.sort();
        dirs.reverse();
        dirs
    }

    fn discover_from_common_paths() -> Option<FreecadInstallation> {
        Self::common_install_paths()
            .iter()
            .filter(|dir| dir.is_dir())
            .find_map(|dir| Self::executable_in(dir))
            .map(|exe| FreecadInstallation::new(exe, DiscoveryMethod::CommonPath))
    }

    fn discover_from_path() -> Option<FreecadInstallation> {
        let path_var = std::env::var_os("PATH")?;
        std::env::split_paths(&path_var)
            .find_map(|dir| Self::executable_in(&dir))
            .map(|exe| FreecadInstallation::new(exe, DiscoveryMethod::SystemPath))
    }

    /// The console executable directly inside `dir`, if present.
    fn executable_in(dir: &Path) -> Option<PathBuf> {
        EXECUTABLE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Search `dir` and its subdirectories up to `max_depth` levels.
    fn find_executable_recursive(dir: &Path, max_depth: usize) -> Option<PathBuf> {
        if let Some(found) = Self::executable_in(dir) {
            return Some(found);
        }
        if max_depth == 0 {
            return None;
        }

        let entries = std::fs::read_dir(dir).ok()?;
        let mut subdirs: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        // `bin` is where FreeCAD keeps its executables.
        subdirs.sort_by_key(|p| p.file_name().is_none_or(|n| n != "bin"));

        subdirs
            .iter()
            .find_map(|sub| Self::find_executable_recursive(sub, max_depth - 1))
    }

    /// Build an installation from a configured path.
    ///
    /// Accepts either the executable itself or a directory containing it
    /// (directly, in `bin/`, or in a versioned subdirectory).
    pub fn from_explicit_path(path: &Path) -> Result<FreecadInstallation, DiscoveryError> {
        if path.is_file() {
            return Ok(FreecadInstallation::new(
                path.to_path_buf(),
                DiscoveryMethod::ExplicitConfig,
            ));
        }

        if path.is_dir() {
            return Self::find_executable_recursive(path, SEARCH_DEPTH)
                .map(|exe| FreecadInstallation::new(exe, DiscoveryMethod::ExplicitConfig))
                .ok_or_else(|| DiscoveryError::ExecutableMissing {
                    install_dir: path.to_path_buf(),
                    executable: Self::executable_filename().to_string(),
                });
        }

        Err(DiscoveryError::NotFound {
            searched: path.display().to_string(),
        })
    }

    /// Check that an installation's executable exists and is non-empty.
    pub fn validate(installation: &FreecadInstallation) -> Result<(), DiscoveryError> {
        let exe = &installation.executable;

        let metadata = std::fs::metadata(exe).map_err(|e| DiscoveryError::Unusable {
            path: exe.clone(),
            reason: e.to_string(),
        })?;

        if !metadata.is_file() {
            return Err(DiscoveryError::Unusable {
                path: exe.clone(),
                reason: "not a regular file".to_string(),
            });
        }
        if metadata.len() == 0 {
            return Err(DiscoveryError::Unusable {
                path: exe.clone(),
                reason: "file is empty".to_string(),
            });
        }

        Ok(())
    }

    /// Preferred executable name on this platform.
    pub fn executable_filename() -> &'static str {
        EXECUTABLE_NAMES[0]
    }
}
