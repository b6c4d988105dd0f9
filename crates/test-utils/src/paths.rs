//! Path utilities for locating test data and building dataset directories.

use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    // Start from the test-utils crate manifest dir
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Searches for a sample data file.
///
/// Locations, in order:
/// 1. `TEST_DATA_DIR` (if set)
/// 2. `crates/cf-dataset/testdata/`
/// 3. `testdata/` at the workspace root
/// 4. `dataset_files/` at the workspace root (the service default)
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(test_data_dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(test_data_dir).join(name));
    }

    let root = workspace_root();
    candidates.extend([
        root.join("crates/cf-dataset/testdata").join(name),
        root.join("testdata").join(name),
        root.join("dataset_files").join(name),
    ]);

    candidates.into_iter().find(|path| path.exists())
}

/// Creates a temporary directory holding empty files with the given names.
///
/// The directory is removed when the returned `TempDir` is dropped.
pub fn dataset_dir<S: AsRef<str>>(names: &[S]) -> TempDir {
    let dir = tempfile::Builder::new()
        .prefix("cf_dataset_")
        .tempdir()
        .expect("Failed to create temporary dataset directory");
    touch_all(dir.path(), names);
    dir
}

/// Create empty files under `dir`.
pub fn touch_all<S: AsRef<str>>(dir: &Path, names: &[S]) {
    for name in names {
        let path = dir.join(name.as_ref());
        File::create(&path).unwrap_or_else(|e| panic!("Failed to create {:?}: {}", path, e));
    }
}
