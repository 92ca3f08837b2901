//! End-to-end conversions with the built-in STL kernel.

mod helpers;

use std::sync::Arc;

use cadconv_converter::{ConversionError, ConversionRequest, Converter, ExportOutcome, Route};
use cadconv_kernel::{GeometryKernel, KernelError, NativeKernel};
use helpers::TETRA_STL;

fn setup() -> (tempfile::TempDir, Arc<NativeKernel>, Converter) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("tetra.stl"), TETRA_STL).expect("write fixture");
    let kernel = Arc::new(NativeKernel::new());
    let converter = Converter::new(kernel.clone());
    (dir, kernel, converter)
}

#[tokio::test]
async fn test_stl_to_stl_round_trip() {
    let (dir, kernel, converter) = setup();
    let output = dir.path().join("copy.stl");

    let report = converter
        .convert(&ConversionRequest::new(dir.path().join("tetra.stl"), &output))
        .await
        .expect("convert");
    assert_eq!(report.route, Route::MeshToMesh);

    // Re-import the written file and sew it: the tetrahedron survives intact.
    let mesh = kernel.load_mesh(&output).await.expect("reload");
    let shape = kernel.shape_from_mesh(&mesh, 0.01).await.expect("shape");
    let faceted = kernel.shape(&shape).expect("faceted");
    assert_eq!(faceted.vertices.len(), 4);
    assert_eq!(faceted.facets.len(), 4);
}

#[tokio::test]
async fn test_uppercase_stl_output_is_a_mesh_export() {
    let (dir, _kernel, converter) = setup();
    let output = dir.path().join("COPY.STL");

    converter
        .convert(&ConversionRequest::new(dir.path().join("tetra.stl"), &output))
        .await
        .expect("convert");
    assert!(std::fs::metadata(&output).expect("output").len() > 0);
}

#[tokio::test]
async fn test_stl_to_step_is_a_kernel_error() {
    let (dir, _kernel, converter) = setup();
    let output = dir.path().join("tetra.stp");

    let err = converter
        .convert(&ConversionRequest::new(dir.path().join("tetra.stl"), &output))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConversionError::Kernel(KernelError::Unsupported { .. })
    ));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_stl_to_unknown_format_is_skipped() {
    let (dir, _kernel, converter) = setup();
    let output = dir.path().join("tetra.xyz");

    let report = converter
        .convert(&ConversionRequest::new(dir.path().join("tetra.stl"), &output))
        .await
        .expect("not an error");
    assert!(matches!(report.outcome, ExportOutcome::Unsupported { .. }));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_missing_input_is_reported() {
    let (dir, _kernel, converter) = setup();

    let err = converter
        .convert(&ConversionRequest::new(
            dir.path().join("absent.stl"),
            dir.path().join("out.stl"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConversionError::Kernel(KernelError::InputNotFound { .. })
    ));
}
