//! # cadconv-kernel
//!
//! The geometry kernel seam used by the converter. [`GeometryKernel`] is the
//! minimal set of mesh and shape operations a conversion needs; two
//! backends implement it:
//!
//! - [`FreecadKernel`] drives an external FreeCAD installation through
//!   generated scripts run by `freecadcmd`.
//! - [`NativeKernel`] handles STL meshes in pure Rust.

pub mod error;
pub mod freecad;
pub mod native;
pub mod traits;

use cadconv_core::config::{KernelBackend, KernelConfig};

pub use error::{KernelError, KernelResult};
pub use freecad::FreecadKernel;
pub use freecad::discovery::{DiscoveryMethod, FreecadDiscovery, FreecadInstallation};
pub use native::NativeKernel;
pub use traits::{GeometryKernel, MeshHandle, NullKernel, ShapeHandle, ShapeOrigin};

/// Build the kernel selected by `config.backend`.
pub fn build_kernel(config: &KernelConfig) -> KernelResult<Box<dyn GeometryKernel>> {
    match config.backend {
        KernelBackend::Freecad => Ok(Box::new(FreecadKernel::from_config(config)?)),
        KernelBackend::Native => Ok(Box::new(NativeKernel::new())),
    }
}
