use super::*;

#[tokio::test]
async fn local_filesystem_round_trips_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/file.txt");
    let fs = LocalFileSystem;

    assert!(!fs.exists(&path).await);
    fs.write_file(&path, b"hello").await.expect("write");
    assert!(fs.exists(&path).await);
    assert_eq!(fs.read_file(&path).await.expect("read"), b"hello");

    fs.remove_file(&path).await.expect("remove");
    assert!(!fs.exists(&path).await);
}

#[tokio::test]
async fn is_directory_distinguishes_dirs_from_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fs = LocalFileSystem;
    let file = dir.path().join("f.txt");
    fs.write_file(&file, b"x").await.expect("write");

    assert!(fs.is_directory(dir.path()).await);
    assert!(!fs.is_directory(&file).await);
}
