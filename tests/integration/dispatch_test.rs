//! Integration tests for conversion routing.

mod helpers;

use std::path::PathBuf;

use cadconv_converter::{ConversionError, ConversionRequest, ExportOutcome, Route};
use cadconv_kernel::KernelError;
use helpers::{Call, RecordingKernel, TestBench};

const FORMATS: [&str; 4] = ["stp", "igs", "brp", "stl"];

#[tokio::test]
async fn test_every_supported_pair_writes_output() {
    for input in FORMATS {
        for output in FORMATS {
            let bench = TestBench::new();
            let out_name = format!("out.{output}");

            let report = bench
                .convert(&format!("in.{input}"), &out_name)
                .await
                .unwrap_or_else(|e| panic!("{input} -> {output}: {e}"));

            assert!(report.wrote_output(), "{input} -> {output}");
            assert!(bench.path(&out_name).is_file(), "{input} -> {output}");
        }
    }
}

#[tokio::test]
async fn test_mesh_to_mesh_never_builds_shape() {
    let bench = TestBench::new();
    let report = bench.convert("a.stl", "b.stl").await.expect("convert");

    assert_eq!(report.route, Route::MeshToMesh);
    assert!(!bench.kernel.created_shape());
    assert_eq!(bench.kernel.ops(), vec!["load_mesh", "export_mesh"]);
}

#[tokio::test]
async fn test_part_to_part_never_loads_mesh() {
    for (input, output) in [("a.stp", "b.igs"), ("a.igs", "b.brp"), ("a.brp", "b.stp")] {
        let bench = TestBench::new();
        let report = bench.convert(input, output).await.expect("convert");

        assert_eq!(report.route, Route::PartToPart);
        assert!(!bench.kernel.created_mesh(), "{input} -> {output}");
    }
}

#[tokio::test]
async fn test_box_step_to_iges() {
    let bench = TestBench::new();
    bench.convert("box.stp", "box.igs").await.expect("convert");

    assert_eq!(
        bench.kernel.ops(),
        vec!["read_shape", "export_iges"],
        "no mesh stage expected"
    );
    assert!(bench.path("box.igs").is_file());
}

#[tokio::test]
async fn test_part_stl_to_brep() {
    let bench = TestBench::new();
    let report = bench.convert("part.stl", "part.brp").await.expect("convert");

    assert_eq!(report.route, Route::MeshToPart);
    let calls = bench.kernel.calls();
    assert_eq!(calls[0], Call::LoadMesh(bench.path("part.stl")));
    assert_eq!(calls[1], Call::ShapeFromMesh(0.01));
    assert_eq!(calls[2], Call::ExportBrep(bench.path("part.brp")));
    assert!(bench.path("part.brp").is_file());
}

#[tokio::test]
async fn test_same_stl_reexported() {
    let bench = TestBench::new();
    bench.convert("a.stl", "a.stl").await.expect("convert");

    assert_eq!(
        bench.kernel.calls()[..2],
        [
            Call::LoadMesh(bench.path("a.stl")),
            Call::ExportMesh(bench.path("a.stl")),
        ]
    );
    assert!(!bench.kernel.created_shape());
}

#[tokio::test]
async fn test_unsupported_output_writes_nothing() {
    let bench = TestBench::new();
    let report = bench.convert("a.stp", "a.xyz").await.expect("not an error");

    assert_eq!(
        report.outcome,
        ExportOutcome::Unsupported {
            extension: ".xyz".to_string()
        }
    );
    assert_eq!(bench.kernel.ops(), vec!["read_shape"]);
    assert!(!bench.path("a.xyz").exists());
    assert!(
        bench
            .progress
            .lines()
            .contains(&"Exporting to .xyz is not supported.".to_string())
    );
}

#[tokio::test]
async fn test_part_exported_as_stl_uses_fixed_tolerance() {
    let bench = TestBench::new();
    bench.convert("body.igs", "body.stl").await.expect("convert");

    assert!(
        bench
            .kernel
            .calls()
            .contains(&Call::ExportStl(bench.path("body.stl"), 0.01))
    );
    assert!(
        bench
            .progress
            .lines()
            .iter()
            .any(|l| l.starts_with("Exporting to a mesh file: "))
    );
}

#[tokio::test]
async fn test_progress_lines_for_part_conversion() {
    let bench = TestBench::new();
    bench.convert("box.stp", "box.brp").await.expect("convert");

    let lines = bench.progress.lines();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], ".stp -> .brp");
    assert!(lines[1].starts_with("Opening a part file: "));
    assert!(lines[2].starts_with("Exporting to part file: "));
    assert!(lines[3].starts_with("Converted the CAD model in "));
}

#[tokio::test]
async fn test_every_handle_is_released() {
    let bench = TestBench::new();
    bench.convert("part.stl", "part.stp").await.expect("convert");
    assert_eq!(bench.kernel.releases(), 2);

    let bench = TestBench::new();
    bench.convert("a.stp", "a.xyz").await.expect("convert");
    assert_eq!(bench.kernel.releases(), 1);
}

#[tokio::test]
async fn test_kernel_failure_propagates_without_retry() {
    let bench = TestBench::with_kernel(RecordingKernel::failing_on("export_iges"));
    let err = bench.convert("box.stp", "box.igs").await.unwrap_err();

    match err {
        ConversionError::Kernel(KernelError::ProcessFailed { stderr, .. }) => {
            assert_eq!(stderr, "export_iges failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(bench.kernel.ops(), vec!["read_shape", "export_iges"]);
    // Handles are still released on failure.
    assert_eq!(bench.kernel.releases(), 1);
}

#[tokio::test]
async fn test_failed_mesh_load_stops_conversion() {
    let bench = TestBench::with_kernel(RecordingKernel::failing_on("load_mesh"));
    assert!(bench.convert("a.stl", "a.stp").await.is_err());
    assert_eq!(bench.kernel.ops(), vec!["load_mesh"]);
    assert!(!bench.path("a.stp").exists());
}

#[tokio::test]
async fn test_unrecognized_input_never_reaches_kernel() {
    for input in ["model.obj", "model.step", "model"] {
        let bench = TestBench::new();
        let err = bench.convert(input, "out.stp").await.unwrap_err();

        assert!(
            matches!(err, ConversionError::UnsupportedInputFormat { .. }),
            "{input}"
        );
        assert!(bench.kernel.calls().is_empty(), "{input}");
    }
}

#[test]
fn test_wrong_argument_count_is_a_usage_error() {
    let arg_lists: [&[&str]; 4] = [&[], &["a.stl"], &["a.stl", "b.stl", "c.stl"], &["a", "b", "c", "d"]];

    for list in arg_lists {
        let args: Vec<PathBuf> = list.iter().map(PathBuf::from).collect();
        let err = ConversionRequest::from_args(&args).unwrap_err();
        assert_eq!(err.count, list.len());
    }
}

#[tokio::test]
async fn test_uppercase_extensions_are_classified() {
    let bench = TestBench::new();
    let report = bench.convert("SCAN.STL", "SCAN.STP").await.expect("convert");

    assert_eq!(report.route, Route::MeshToPart);
    assert!(bench.kernel.ops().contains(&"export_step"));
}
