//! Command-line definition.

use std::path::PathBuf;

use cadconv_core::AppResult;
use cadconv_core::config::{AppConfig, KernelBackend};
use cadconv_converter::{ConversionRequest, UsageError};
use clap::{CommandFactory, Parser};

/// cadconv: convert between CAD mesh (STL) and part (STEP, IGES, BREP) formats
#[derive(Debug, Parser)]
#[command(
    name = "cadconv",
    version,
    about,
    long_about = None,
    after_help = "Example: cadconv input.stp output.igs"
)]
pub struct Cli {
    /// Input file followed by output file (<input filename.ext> <output filename.ext>)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Geometry kernel backend (freecad or native), overrides the configuration
    #[arg(short, long, value_name = "BACKEND")]
    pub kernel: Option<KernelBackend>,

    /// Show which geometry kernel would be used and exit
    #[arg(long)]
    pub kernel_info: bool,
}

/// What the invocation asks for.
#[derive(Debug)]
pub enum Action {
    Convert(ConversionRequest),
    KernelInfo,
}

impl Cli {
    /// Resolve the action; a conversion needs exactly two files.
    pub fn action(&self) -> Result<Action, UsageError> {
        if self.kernel_info {
            return Ok(Action::KernelInfo);
        }
        ConversionRequest::from_args(&self.files).map(Action::Convert)
    }

    /// Load configuration and apply command-line overrides.
    pub fn load_config(&self) -> AppResult<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(backend) = self.kernel {
            config.kernel.backend = backend;
        }
        Ok(config)
    }
}

/// Print the full help screen to stdout.
pub fn print_usage() {
    if let Err(e) = Cli::command().print_long_help() {
        eprintln!("Failed to print help: {e}");
    }
}
