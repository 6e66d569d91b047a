use corestack_protocol::LocalFileSystem;

use super::*;

#[tokio::test]
async fn prefers_package_manifest_scripts_over_makefile() {
    let dir = tempfile::tempdir().expect("tempdir");
    tokio::fs::write(dir.path().join("package.json"), r#"{"scripts": {"test": "cargo test", "lint": "cargo clippy"}}"#)
        .await
        .expect("write package.json");
    tokio::fs::write(dir.path().join("Makefile"), "build:\n\techo hi\n").await.expect("write Makefile");

    let found = discover_commands(&LocalFileSystem, dir.path(), &[]).await;
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|c| c.source == CommandSource::PackageManifestScript));
}

#[tokio::test]
async fn falls_back_to_makefile_targets_without_manifest() {
    let dir = tempfile::tempdir().expect("tempdir");
    tokio::fs::write(dir.path().join("Makefile"), "build: deps\n\techo building\n\ntest:\n\techo testing\n\n.PHONY: test\n")
        .await
        .expect("write Makefile");

    let found = discover_commands(&LocalFileSystem, dir.path(), &[]).await;
    let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
    assert!(names.contains(&"build"));
    assert!(names.contains(&"test"));
    assert!(found.iter().all(|c| c.source == CommandSource::MakefileTarget));
}

#[tokio::test]
async fn falls_back_to_configured_commands_when_nothing_discovered() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fallback = vec!["echo fallback".to_string()];

    let found = discover_commands(&LocalFileSystem, dir.path(), &fallback).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].source, CommandSource::ConfiguredFallback);
    assert_eq!(found[0].command, "echo fallback");
}

#[tokio::test]
async fn ignores_malformed_package_manifest() {
    let dir = tempfile::tempdir().expect("tempdir");
    tokio::fs::write(dir.path().join("package.json"), "not json").await.expect("write package.json");

    let found = discover_commands(&LocalFileSystem, dir.path(), &["echo fallback".to_string()]).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].source, CommandSource::ConfiguredFallback);
}
