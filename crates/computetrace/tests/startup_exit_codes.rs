use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn bundled_shader(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../shaders")
        .join(name)
}

/// Runs the binary with an empty config file so the user's own configuration
/// never leaks into the test.
fn run_with(dir: &TempDir, args: &[&str]) -> Output {
    let config = dir.path().join("config.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    Command::new(env!("CARGO_BIN_EXE_computetrace"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .env_remove("COMPUTETRACE_CONFIG")
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to launch computetrace")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn missing_compute_shader_exits_with_3() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.glsl");

    let output = run_with(&dir, &["--compute", missing.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Compute shader file not found"));
}

#[test]
fn broken_compute_shader_reports_diagnostics() {
    let dir = TempDir::new().unwrap();
    let kernel = dir.path().join("broken.glsl");
    fs::write(&kernel, "#version 450\nvoid main() { float x = ; }\n").unwrap();

    let output = run_with(&dir, &["--compute", kernel.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(3));
    let text = stderr(&output);
    assert!(text.contains("Compute program compilation error"));
    assert!(text.contains("compute stage"));
}

#[test]
fn missing_vertex_shader_exits_with_4() {
    let dir = TempDir::new().unwrap();
    let compute = bundled_shader("pathtrace.glsl");
    let missing = dir.path().join("missing.vert");

    let output = run_with(
        &dir,
        &[
            "--compute",
            compute.to_str().unwrap(),
            "--vertex",
            missing.to_str().unwrap(),
        ],
    );

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("Vertex shader file not found"));
}

#[test]
fn broken_fragment_shader_exits_with_4() {
    let dir = TempDir::new().unwrap();
    let fragment = dir.path().join("broken.frag");
    fs::write(
        &fragment,
        "#version 450\nlayout(location = 0) out vec4 color;\nvoid main() { color = ; }\n",
    )
    .unwrap();
    let compute = bundled_shader("pathtrace.glsl");
    let vertex = bundled_shader("vertex.glsl");

    let output = run_with(
        &dir,
        &[
            "--compute",
            compute.to_str().unwrap(),
            "--vertex",
            vertex.to_str().unwrap(),
            "--fragment",
            fragment.to_str().unwrap(),
        ],
    );

    assert_eq!(output.status.code(), Some(4));
    let text = stderr(&output);
    assert!(text.contains("Render program compilation error"));
    assert!(text.contains("fragment stage"));
    assert!(!text.contains("vertex stage"));
}

#[test]
fn invalid_configuration_exits_with_5() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.toml"), "version = 2\n").unwrap();

    let output = run_with(&dir, &[]);

    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("unsupported config version"));
}

#[test]
fn malformed_size_exits_with_5() {
    let dir = TempDir::new().unwrap();
    let output = run_with(&dir, &["--size", "wide"]);
    assert_eq!(output.status.code(), Some(5));
}
