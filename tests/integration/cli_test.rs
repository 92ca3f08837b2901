//! Tests for the `cadconv` binary: argument handling and exit status.

mod helpers;

use std::path::Path;
use std::process::{Command, Output};

fn cadconv(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cadconv"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env("CADCONV__KERNEL__BACKEND", "native")
        .output()
        .expect("run cadconv")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_wrong_argument_counts_print_help() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.stl"), helpers::TETRA_STL).expect("write");

    for args in [&[][..], &["a.stl"][..], &["a.stl", "b.stl", "c.stl"][..]] {
        let output = cadconv(dir.path(), args);
        assert_eq!(output.status.code(), Some(2), "{args:?}");

        let text = stdout(&output);
        assert!(text.contains("cadconv input.stp output.igs"), "{args:?}");
        assert!(!text.contains(" -> "), "conversion started for {args:?}");
    }
    assert!(!dir.path().join("b.stl").exists());
    assert!(!dir.path().join("c.stl").exists());
}

#[test]
fn test_native_stl_conversion() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.stl"), helpers::TETRA_STL).expect("write");

    let output = cadconv(dir.path(), &["a.stl", "b.stl"]);
    assert_eq!(output.status.code(), Some(0));

    let text = stdout(&output);
    assert!(text.contains(".stl -> .stl"));
    assert!(text.contains("Mesh file: a.stl"));
    assert!(text.contains("Converted the CAD model in "));
    assert!(dir.path().join("b.stl").is_file());
}

#[test]
fn test_unsupported_output_exits_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.stl"), helpers::TETRA_STL).expect("write");

    let output = cadconv(dir.path(), &["a.stl", "a.xyz"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("Exporting to .xyz is not supported."));
    assert!(!dir.path().join("a.xyz").exists());
}

#[test]
fn test_kernel_error_exits_one() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = cadconv(dir.path(), &["missing.stl", "out.stl"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: "));
}

#[test]
fn test_kernel_flag_overrides_configuration() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("cadconv.toml"),
        "[kernel]\nbackend = \"freecad\"\nfreecad_path = \"/nonexistent\"\n",
    )
    .expect("write config");

    let output = Command::new(env!("CARGO_BIN_EXE_cadconv"))
        .args(["--kernel", "native", "--kernel-info"])
        .current_dir(dir.path())
        .env_remove("CADCONV__KERNEL__BACKEND")
        .output()
        .expect("run cadconv");
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("native"));
}
