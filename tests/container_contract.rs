use std::path::Path;

fn read(name: &str) -> String {
    std::fs::read_to_string(Path::new(env!("CARGO_MANIFEST_DIR")).join(name)).unwrap()
}

fn rust_version() -> String {
    let manifest: toml::Value = toml::from_str(&read("Cargo.toml")).unwrap();
    manifest["package"]["rust-version"].as_str().unwrap().to_string()
}

#[test]
fn test_builder_image_matches_declared_toolchain() {
    let dockerfile = read("Dockerfile");
    let builder = format!("FROM rust:{}-slim-bookworm AS builder", rust_version());
    assert!(dockerfile.lines().any(|l| l == builder), "missing `{}`", builder);
    assert!(dockerfile.lines().any(|l| l == "FROM debian:bookworm-slim"));
}

#[test]
fn test_build_is_held_to_lockfile_when_present() {
    let dockerfile = read("Dockerfile");
    assert!(dockerfile.contains("COPY Cargo.toml Cargo.lock* ./"));
    assert!(dockerfile.contains("cargo build --release --locked --bins"));

    let manifest: toml::Value = toml::from_str(&read("Cargo.toml")).unwrap();
    assert_eq!(manifest["package"]["resolver"].as_str(), Some("3"));
}

#[test]
fn test_runtime_runs_checker_from_app() {
    let dockerfile = read("Dockerfile");
    let runtime = dockerfile.split("FROM debian:bookworm-slim").nth(1).unwrap();
    assert!(runtime.contains("WORKDIR /app"));
    assert!(runtime.contains("COPY . ."));
    assert_eq!(runtime.trim_end().lines().last(), Some(r#"CMD ["scheduler-check"]"#));
}
