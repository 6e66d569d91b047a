//! The file system adapter interface (spec.md §6 "External Interfaces").
//!
//! The concrete file system is an external collaborator (spec.md §1
//! Non-goals); every crate that touches the workspace tree — checkpoint,
//! diff, context snapshot, tools — depends on this trait rather than
//! `std::fs`/`tokio::fs` directly, so a caller can inject a sandboxed or
//! in-memory implementation (`corestack-testkit` provides one for tests).

use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;

/// Minimal file system surface the core needs: read/write/list/exists.
/// Deliberately has no symlink, permission-bit, or atomic-rename API —
/// those are a concrete adapter's problem, not this interface's.
#[async_trait]
pub trait FileSystemAdapter: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;
    async fn is_directory(&self, path: &Path) -> bool;
    async fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>>;
    async fn write_file(&self, path: &Path, contents: &[u8]) -> std::io::Result<()>;
    async fn remove_file(&self, path: &Path) -> std::io::Result<()>;
    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;
    async fn read_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>>;
    async fn metadata_mtime(&self, path: &Path) -> std::io::Result<std::time::SystemTime>;
}

/// The default, real-disk implementation used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystemAdapter for LocalFileSystem {
    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }

    async fn is_directory(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await
    }

    async fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn read_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(path).await?;
        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            out.push(entry.path());
        }
        Ok(out)
    }

    async fn metadata_mtime(&self, path: &Path) -> std::io::Result<std::time::SystemTime> {
        tokio::fs::metadata(path).await?.modified()
    }
}

#[cfg(test)]
#[path = "fs_adapter.test.rs"]
mod tests;
