//! Tests for the RealFileSystem implementation

use ocrdeploy::infrastructure::traits::{FileSystem, RealFileSystem};
use std::fs;
use tempfile::TempDir;

#[test]
fn given_regular_file_when_checking_then_is_file_and_exists() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let photo = temp.path().join("photo.jpg");
    fs::write(&photo, b"jpeg").unwrap();

    let fs = RealFileSystem;

    // Act / Assert
    assert!(fs.exists(&photo));
    assert!(fs.is_file(&photo));
    assert!(fs.exists(temp.path()));
    assert!(!fs.is_file(temp.path()), "a directory is not a photo");
}

#[test]
fn given_nested_target_when_ensure_parent_then_creates_directories() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("config").join("ocrdeploy").join("ocrdeploy.toml");
    let fs = RealFileSystem;

    // Act
    fs.ensure_parent(&target).unwrap();
    fs.write(&target, "region = \"us-east1\"\n").unwrap();

    // Assert
    assert!(target.parent().unwrap().is_dir());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "region = \"us-east1\"\n");
}

#[test]
fn given_bare_file_name_when_ensure_parent_then_noop() {
    let fs = RealFileSystem;

    assert!(fs.ensure_parent(std::path::Path::new("ocrdeploy.toml")).is_ok());
}
