//! cadconv entry point.
//!
//! Exit status: 0 on success (including an unsupported output format, which
//! writes nothing), 1 on configuration, kernel or I/O errors, 2 on usage
//! errors.

mod cli;
mod output;

use std::sync::Arc;

use cadconv_core::AppResult;
use cadconv_core::config::{AppConfig, KernelBackend};
use cadconv_core::error::AppError;
use cadconv_converter::{ConversionRequest, Converter, ExportOutcome};
use cadconv_kernel::{FreecadDiscovery, build_kernel};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use cli::{Action, Cli};
use output::{ConsoleProgress, print_error, print_kv, print_success, print_warning};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let action = match cli.action() {
        Ok(action) => action,
        Err(e) => {
            cli::print_usage();
            let err = AppError::from(e);
            print_error(&err.message);
            std::process::exit(err.exit_code());
        }
    };

    let config = match cli.load_config() {
        Ok(c) => c,
        Err(e) => {
            print_error(&format!("Failed to load configuration: {}", e.message));
            std::process::exit(e.exit_code());
        }
    };

    init_logging(&config);

    if let Err(e) = run(action, config).await {
        tracing::error!(kind = %e.kind, "{}", e.message);
        print_error(&e.message);
        std::process::exit(e.exit_code());
    }
}

/// Initialize tracing. Logs go to stderr so stdout carries only progress.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(action: Action, config: AppConfig) -> AppResult<()> {
    match action {
        Action::Convert(request) => convert(&request, &config).await,
        Action::KernelInfo => {
            kernel_info(&config);
            Ok(())
        }
    }
}

async fn convert(request: &ConversionRequest, config: &AppConfig) -> AppResult<()> {
    tracing::info!(backend = %config.kernel.backend, "Setting up geometry kernel");
    let kernel = build_kernel(&config.kernel)?;

    let converter = Converter::new(Arc::from(kernel)).with_progress(Arc::new(ConsoleProgress));
    let report = converter.convert(request).await?;

    if let ExportOutcome::Unsupported { extension } = &report.outcome {
        tracing::warn!(extension = %extension, "No output written");
    }
    Ok(())
}

fn kernel_info(config: &AppConfig) {
    let kernel = &config.kernel;
    print_kv("Backend", kernel.backend);
    print_kv("Timeout", format!("{}s", kernel.timeout_seconds));
    print_kv("Scratch root", kernel.effective_scratch_root().display());

    match kernel.backend {
        KernelBackend::Native => {
            print_success("Native kernel available (STL meshes only)");
        }
        KernelBackend::Freecad => {
            let explicit = kernel
                .has_explicit_freecad_path()
                .then_some(kernel.freecad_path.as_path());
            match FreecadDiscovery::resolve(explicit) {
                Ok(installation) => {
                    print_kv("Executable", installation.executable.display());
                    print_kv(
                        "Version",
                        installation.version.as_deref().unwrap_or("unknown"),
                    );
                    print_kv("Found via", format!("{:?}", installation.discovery_method));
                    print_success("FreeCAD kernel available");
                }
                Err(e) => print_warning(&format!("FreeCAD kernel not available: {e}")),
            }
        }
    }
}
